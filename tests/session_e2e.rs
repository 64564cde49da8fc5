use anyhow::Result;
use ferry::codec::recv_u64;
use ferry::frame::{receive_line, send_line, send_status};
use ferry::logger::NoopLogger;
use ferry::transfer::{download, list, upload};
use ferry::{client, server};
use ferry::{DownloadOutcome, SessionConfig, Status, TransferError, UploadOutcome, WireError};
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};

fn write_file(path: &Path, size: usize) -> Result<Vec<u8>> {
    // Deterministic bytes with plenty of zeros mixed in
    let data: Vec<u8> = (0..size)
        .map(|i| if i % 7 == 0 { 0 } else { (i * 31 % 256) as u8 })
        .collect();
    std::fs::write(path, &data)?;
    Ok(data)
}

fn spawn_server(cfg: SessionConfig) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let handle = thread::spawn(move || server::serve_on(listener, &cfg, &NoopLogger));
    Ok((addr, handle))
}

fn config_for(root: &Path) -> SessionConfig {
    SessionConfig {
        root: root.to_path_buf(),
        ..SessionConfig::default()
    }
}

fn finish(mut stream: TcpStream, server: JoinHandle<Result<()>>, cfg: &SessionConfig) -> Result<()> {
    send_line(&mut stream, "EXIT", cfg.frame_size)?;
    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn upload_download_round_trip() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    let (addr, server) = spawn_server(config_for(srv.path()))?;
    let cfg = config_for(cli.path());
    let mut stream = TcpStream::connect(addr)?;

    for size in [0usize, 1, 1023, 1024, 1025, 64 * 1024 + 3, 3 * 1024 * 1024] {
        let name = format!("f{size}.bin");
        let original = write_file(&cli.path().join(&name), size)?;

        let up = upload(&mut stream, &cli.path().join(&name), &name, &cfg)?;
        assert_eq!(up, UploadOutcome::Completed { bytes: size as u64 });
        assert_eq!(std::fs::read(srv.path().join(&name))?, original);

        let back = cli.path().join(format!("back-{name}"));
        let down = download(&mut stream, &back, &name, &cfg)?;
        assert_eq!(down, DownloadOutcome::Completed { bytes: size as u64 });
        assert_eq!(std::fs::read(&back)?, original);
    }

    finish(stream, server, &cfg)
}

#[test]
fn reupload_overwrites_instead_of_appending() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    let (addr, server) = spawn_server(config_for(srv.path()))?;
    let cfg = config_for(cli.path());
    let mut stream = TcpStream::connect(addr)?;

    let src = cli.path().join("notes.txt");
    std::fs::write(&src, "first version, rather long")?;
    upload(&mut stream, &src, "notes.txt", &cfg)?;
    std::fs::write(&src, "second")?;
    upload(&mut stream, &src, "notes.txt", &cfg)?;

    assert_eq!(std::fs::read_to_string(srv.path().join("notes.txt"))?, "second");
    finish(stream, server, &cfg)
}

#[test]
fn missing_download_sends_error_and_session_continues() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    std::fs::write(srv.path().join("present.txt"), "x")?;
    let (addr, server) = spawn_server(config_for(srv.path()))?;
    let cfg = config_for(cli.path());
    let mut stream = TcpStream::connect(addr)?;

    let dst = cli.path().join("nonexistent");
    assert_eq!(download(&mut stream, &dst, "nonexistent", &cfg)?, DownloadOutcome::NotFound);
    assert!(!dst.exists());

    // Nothing but the ERROR marker was sent: the next reply lines up
    assert_eq!(list(&mut stream, &cfg)?, "present.txt\n");
    finish(stream, server, &cfg)
}

#[test]
fn missing_upload_sends_no_bytes() -> Result<()> {
    let cli = tempfile::tempdir()?;
    let cfg = config_for(cli.path());
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let observer = thread::spawn(move || -> Result<Vec<u8>> {
        let (mut conn, _) = listener.accept()?;
        let mut seen = Vec::new();
        conn.read_to_end(&mut seen)?;
        Ok(seen)
    });

    let mut stream = TcpStream::connect(addr)?;
    let outcome = upload(&mut stream, &cli.path().join("ghost.bin"), "ghost.bin", &cfg)?;
    assert_eq!(outcome, UploadOutcome::MissingLocal);
    stream.shutdown(Shutdown::Write)?;

    let seen = observer.join().expect("observer panicked")?;
    assert!(seen.is_empty());
    Ok(())
}

#[test]
fn length_prefix_matches_payload() -> Result<()> {
    let cli = tempfile::tempdir()?;
    let cfg = SessionConfig {
        upload_ack: false,
        ..config_for(cli.path())
    };
    let data = write_file(&cli.path().join("blob"), 10_000)?;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let frame_size = cfg.frame_size;
    let observer = thread::spawn(move || -> Result<(String, u64, Vec<u8>)> {
        let (mut conn, _) = listener.accept()?;
        let line = receive_line(&mut conn, frame_size)?;
        let declared = recv_u64(&mut conn)?;
        let mut rest = Vec::new();
        conn.read_to_end(&mut rest)?;
        Ok((line, declared, rest))
    });

    let mut stream = TcpStream::connect(addr)?;
    upload(&mut stream, &cli.path().join("blob"), "blob", &cfg)?;
    stream.shutdown(Shutdown::Write)?;

    let (line, declared, payload) = observer.join().expect("observer panicked")?;
    assert_eq!(line, "UPLOAD blob");
    assert_eq!(declared, payload.len() as u64);
    assert_eq!(payload, data);
    Ok(())
}

#[test]
fn disconnect_mid_download_removes_partial_file() -> Result<()> {
    let cli = tempfile::tempdir()?;
    let cfg = config_for(cli.path());
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let frame_size = cfg.frame_size;
    let fake = thread::spawn(move || -> Result<()> {
        let (mut conn, _) = listener.accept()?;
        let _ = receive_line(&mut conn, frame_size)?;
        send_status(&mut conn, Status::Ok, frame_size)?;
        conn.write_all(&5000u64.to_be_bytes())?;
        conn.write_all(&[0xAB; 3000])?;
        Ok(())
    });

    let mut stream = TcpStream::connect(addr)?;
    let dst = cli.path().join("partial.bin");
    let err = download(&mut stream, &dst, "partial.bin", &cfg).unwrap_err();
    assert!(matches!(err, TransferError::Wire(WireError::Closed)));
    assert!(err.is_connection_fatal());
    assert!(!dst.exists());

    fake.join().expect("fake server panicked")?;
    Ok(())
}

#[test]
fn list_hides_dot_entries_and_reports_empty() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    let (addr, server) = spawn_server(config_for(srv.path()))?;
    let cfg = config_for(cli.path());
    let mut stream = TcpStream::connect(addr)?;

    assert_eq!(list(&mut stream, &cfg)?, "No files found\n");

    std::fs::write(srv.path().join(".env"), "secret")?;
    std::fs::write(srv.path().join("report.pdf"), "pdf")?;
    std::fs::write(srv.path().join("a.txt"), "a")?;
    assert_eq!(list(&mut stream, &cfg)?, "a.txt\nreport.pdf\n");

    finish(stream, server, &cfg)
}

#[test]
fn interactive_client_against_real_server() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    let (addr, server) = spawn_server(config_for(srv.path()))?;
    let cfg = config_for(cli.path());
    std::fs::write(cli.path().join("hello.txt"), "hello over the wire")?;

    let mut stream = TcpStream::connect(addr)?;
    let script = "upload hello.txt\nlist\n\ndownload nope.txt\nDOWNLOAD hello.txt\nexit\n";
    let mut out = Vec::new();
    let end = client::run(&mut stream, script.as_bytes(), &mut out, &cfg)?;
    assert_eq!(end, client::LoopEnd::Exit);
    server.join().expect("server thread panicked")?;

    let printed = String::from_utf8(out)?;
    assert!(printed.contains("Upload completed"));
    assert!(printed.contains("hello.txt\n"));
    assert!(printed.contains("File not found on server side"));
    assert!(printed.contains("Download completed"));
    assert!(printed.ends_with("Connection closed.\n"));
    assert_eq!(
        std::fs::read_to_string(srv.path().join("hello.txt"))?,
        "hello over the wire"
    );
    Ok(())
}

#[test]
fn keep_listening_serves_clients_in_sequence() -> Result<()> {
    let srv = tempfile::tempdir()?;
    let cli = tempfile::tempdir()?;
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let server_cfg = SessionConfig {
        keep_listening: true,
        ..config_for(srv.path())
    };
    // The accept loop never returns in this mode; the thread is left running
    thread::spawn(move || server::serve_on(listener, &server_cfg, &NoopLogger));
    let cfg = config_for(cli.path());

    for i in 0..3 {
        let name = format!("c{i}.txt");
        std::fs::write(cli.path().join(&name), format!("client {i}"))?;
        let mut stream = TcpStream::connect(addr)?;
        upload(&mut stream, &cli.path().join(&name), &name, &cfg)?;
        send_line(&mut stream, "EXIT", cfg.frame_size)?;
    }

    let mut stream = TcpStream::connect(addr)?;
    assert_eq!(list(&mut stream, &cfg)?, "c0.txt\nc1.txt\nc2.txt\n");
    Ok(())
}

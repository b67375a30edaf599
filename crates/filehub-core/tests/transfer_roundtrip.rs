//! Integration tests for the filehub-core transfer engine.
//!
//! These tests run an uploader and a receiver concurrently over an in-memory
//! `duplex` pipe, exactly as a client and a session would over TCP, and
//! verify the bytes that land on disk.

use std::path::Path;

use filehub_core::protocol::frame::{read_string, write_string};
use filehub_core::protocol::replies;
use filehub_core::transfer::{download, upload, DownloadOutcome, RejectReason, CHUNK_SIZE};
use tempfile::TempDir;
use tokio::io::{duplex, split};

/// Deterministic, non-repeating-looking content of `len` bytes.
fn sample_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Uploads `source` to a receiver storing into `dest`; returns both results.
async fn transfer(source: &Path, dest: &Path) -> (Option<String>, DownloadOutcome) {
    let (client, server) = duplex(CHUNK_SIZE);
    let (mut client_rx, mut client_tx) = split(client);
    let (mut server_rx, mut server_tx) = split(server);

    let dest = dest.to_path_buf();
    let receiver = tokio::spawn(async move {
        let outcome = download(&mut server_rx, &dest).await.expect("download");
        write_string(&mut server_tx, outcome.status_message())
            .await
            .expect("status");
        outcome
    });

    let report = upload(&mut client_rx, &mut client_tx, source)
        .await
        .expect("upload");
    let outcome = receiver.await.expect("receiver task");
    (report.status, outcome)
}

#[tokio::test]
async fn test_roundtrip_upload_then_download_back_is_byte_identical() {
    // Arrange: a file spanning several chunks plus a partial one
    let client_dir = TempDir::new().unwrap();
    let catalogue = TempDir::new().unwrap();
    let back_dir = TempDir::new().unwrap();
    let original = sample_content(CHUNK_SIZE * 5 + 321);
    let source = client_dir.path().join("photo.raw");
    std::fs::write(&source, &original).unwrap();

    // Act: client -> catalogue, then catalogue -> another directory
    let (status, first) = transfer(&source, catalogue.path()).await;
    let stored = catalogue.path().join("photo.raw");
    let (_, second) = transfer(&stored, back_dir.path()).await;

    // Assert
    assert_eq!(status.as_deref(), Some(replies::FILE_RECEIVED));
    assert!(matches!(first, DownloadOutcome::Stored(_)));
    assert!(matches!(second, DownloadOutcome::Stored(_)));
    let returned = std::fs::read(back_dir.path().join("photo.raw")).unwrap();
    assert_eq!(returned.len(), original.len());
    assert_eq!(returned, original);
}

#[tokio::test]
async fn test_roundtrip_exact_chunk_multiple() {
    let client_dir = TempDir::new().unwrap();
    let catalogue = TempDir::new().unwrap();
    let original = sample_content(CHUNK_SIZE * 3);
    let source = client_dir.path().join("aligned.bin");
    std::fs::write(&source, &original).unwrap();

    transfer(&source, catalogue.path()).await;

    assert_eq!(
        std::fs::read(catalogue.path().join("aligned.bin")).unwrap(),
        original
    );
}

#[tokio::test]
async fn test_second_upload_of_same_name_is_rejected_without_overwrite() {
    // Arrange
    let client_dir = TempDir::new().unwrap();
    let catalogue = TempDir::new().unwrap();
    let source = client_dir.path().join("report.txt");
    std::fs::write(&source, b"first version").unwrap();
    transfer(&source, catalogue.path()).await;

    // Act: same name, different content
    std::fs::write(&source, b"second, longer version of the report")
        .unwrap();
    let (status, outcome) = transfer(&source, catalogue.path()).await;

    // Assert
    assert_eq!(status.as_deref(), Some(replies::FILE_ALREADY_EXISTS));
    assert!(matches!(
        outcome,
        DownloadOutcome::Rejected {
            reason: RejectReason::AlreadyExists,
            ..
        }
    ));
    assert_eq!(
        std::fs::read(catalogue.path().join("report.txt")).unwrap(),
        b"first version"
    );
}

#[tokio::test]
async fn test_connection_usable_after_rejected_upload() {
    // Arrange
    let client_dir = TempDir::new().unwrap();
    let catalogue = TempDir::new().unwrap();
    let source = client_dir.path().join("dup.txt");
    std::fs::write(&source, sample_content(CHUNK_SIZE + 1))
        .unwrap();
    std::fs::write(catalogue.path().join("dup.txt"), b"already here")
        .unwrap();

    let (client, server) = duplex(CHUNK_SIZE);
    let (mut client_rx, mut client_tx) = split(client);
    let (mut server_rx, mut server_tx) = split(server);
    let dest = catalogue.path().to_path_buf();

    // Act: receiver handles the rejected file, then reads the next command
    let receiver = tokio::spawn(async move {
        let outcome = download(&mut server_rx, &dest).await.unwrap();
        write_string(&mut server_tx, outcome.status_message())
            .await
            .unwrap();
        read_string(&mut server_rx).await.unwrap()
    });
    upload(&mut client_rx, &mut client_tx, &source)
        .await
        .unwrap();
    write_string(&mut client_tx, "catalogs").await.unwrap();

    // Assert
    assert_eq!(receiver.await.unwrap(), "catalogs");
}

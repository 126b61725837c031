// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Cursor;

fn reader(bytes: &[u8]) -> FrameReader<Cursor<Vec<u8>>> {
    FrameReader::new(Cursor::new(bytes.to_vec()))
}

#[tokio::test]
async fn write_appends_newline() {
    let mut out = Vec::new();
    write_frame(&mut out, "abc").await.unwrap();
    assert_eq!(out, b"abc\n");
}

#[tokio::test]
async fn write_rejects_embedded_newline() {
    let mut out = Vec::new();
    let err = write_frame(&mut out, "a\nb").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
    assert!(out.is_empty());
}

#[tokio::test]
async fn reads_frames_in_order() {
    let mut r = reader(b"one\ntwo\r\nthree\n");
    assert_eq!(r.next_frame().await.unwrap(), "one");
    assert_eq!(r.next_frame().await.unwrap(), "two");
    assert_eq!(r.next_frame().await.unwrap(), "three");
    assert!(matches!(r.next_frame().await, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn skips_blank_lines() {
    let mut r = reader(b"\n\nx\n");
    assert_eq!(r.next_frame().await.unwrap(), "x");
}

#[tokio::test]
async fn partial_frame_at_eof_is_closed() {
    let mut r = reader(b"dangling");
    assert!(matches!(r.next_frame().await, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn invalid_utf8_is_malformed() {
    let mut r = reader(b"\xff\xfe\n");
    assert!(matches!(r.next_frame().await, Err(ProtocolError::Malformed(_))));
}

#[tokio::test]
async fn partial_frame_survives_timeout() {
    let (client, mut server) = tokio::io::duplex(64);
    let mut r = FrameReader::new(tokio::io::BufReader::new(client));

    server.write_all(b"hel").await.unwrap();
    let timed_out =
        tokio::time::timeout(std::time::Duration::from_millis(20), r.next_frame()).await;
    assert!(timed_out.is_err());
    assert_eq!(r.pending(), 3);

    server.write_all(b"lo\n").await.unwrap();
    assert_eq!(r.next_frame().await.unwrap(), "hello");
}

#[tokio::test]
async fn write_then_read() {
    let mut out = Vec::new();
    write_frame(&mut out, "first").await.unwrap();
    write_frame(&mut out, "second").await.unwrap();
    let mut r = reader(&out);
    assert_eq!(r.next_frame().await.unwrap(), "first");
    assert_eq!(r.next_frame().await.unwrap(), "second");
}

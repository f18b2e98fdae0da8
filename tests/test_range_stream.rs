//! RangeStream driven through tokio's AsyncReadExt / AsyncSeekExt.

mod common;

use std::io::{ErrorKind, SeekFrom};

use common::{FakeServer, Scripted, content};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[tokio::test]
async fn read_to_end_reproduces_the_resource() {
    let data = content(5_000);
    let server = FakeServer::new(data.clone());
    let mut stream = server.reader().with_min_fetch(1024).into_stream();

    let mut out = Vec::new();
    assert_eq!(stream.read_to_end(&mut out).await.unwrap(), 5_000);
    assert_eq!(out, data);
    assert_eq!(stream.get_ref().unwrap().position(), 5_000);
}

#[tokio::test]
async fn seek_then_read() {
    let data = content(5_000);
    let server = FakeServer::new(data.clone());
    let mut stream = server.reader().with_min_fetch(1024).into_stream();

    assert_eq!(stream.seek(SeekFrom::Start(100)).await.unwrap(), 100);
    let mut buf = [0u8; 10];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf[..], &data[100..110]);
    assert_eq!(stream.stream_position().await.unwrap(), 110);

    assert_eq!(stream.seek(SeekFrom::End(-10)).await.unwrap(), 4_990);
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert_eq!(rest, &data[4_990..]);
    assert_eq!(server.heads(), 1);
}

#[tokio::test]
async fn end_of_data_is_a_zero_length_read() {
    let server = FakeServer::new(content(10));
    let mut stream = server.reader().with_known_size(10).into_stream();

    stream.seek(SeekFrom::End(0)).await.unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn negative_seek_is_rejected_and_keeps_position() {
    let server = FakeServer::new(content(100));
    let mut stream = server.reader().with_known_size(100).into_stream();

    stream.seek(SeekFrom::Start(40)).await.unwrap();
    let err = stream.seek(SeekFrom::Current(-41)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(stream.stream_position().await.unwrap(), 40);

    let err = stream.seek(SeekFrom::End(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    assert_eq!(stream.stream_position().await.unwrap(), 40);
}

#[tokio::test]
async fn transport_failure_surfaces_as_io_error() {
    let transport = Scripted::new(vec![Err("connection refused".into())]);
    let mut stream = transport.reader().into_stream();

    let mut buf = [0u8; 4];
    let err = stream.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(stream.into_inner().unwrap().position(), 0);
}

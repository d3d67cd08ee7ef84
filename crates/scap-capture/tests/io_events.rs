//! Events of real `read`, `pread64`, `pwrite64`, and `close` calls.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, IntoRawFd};

use scap_capture::{EventTest, trigger};
use scap_common::config::CaptureConfig;
use scap_common::types::{Direction, SyscallId};

fn file_with(content: &[u8]) -> std::fs::File {
    let mut file = tempfile::tempfile().expect("tempfile");
    file.write_all(content).expect("fill");
    let _ = file.seek(SeekFrom::Start(0)).expect("rewind");
    file
}

#[test]
fn read_exit_captures_bytes_actually_read() {
    let mut evt = EventTest::new(SyscallId::READ, Direction::Exit).expect("event test");
    let probe = evt.enable_capture().expect("enable");

    let file = file_with(b"short file");
    let mut buf = [0u8; 256];
    let n = trigger::read(&probe, file.as_raw_fd(), &mut buf).expect("read");
    assert_eq!(n, 10);

    evt.disable_capture().expect("disable");
    let _ = evt.parse_event().expect("parse");
    evt.assert_header().expect("header");
    evt.assert_numeric_param(1, 10).expect("res");
    evt.assert_bytebuf_param(2, b"short file", 10).expect("data");
    evt.assert_num_params_pushed(2).expect("count");
}

#[test]
fn read_at_end_of_file_is_empty() {
    let mut evt = EventTest::new(SyscallId::READ, Direction::Exit).expect("event test");
    let probe = evt.enable_capture().expect("enable");

    let file = file_with(b"");
    let mut buf = [0u8; 16];
    assert_eq!(trigger::read(&probe, file.as_raw_fd(), &mut buf).expect("read"), 0);

    evt.disable_capture().expect("disable");
    let _ = evt.parse_event().expect("parse");
    evt.assert_numeric_param(1, 0).expect("res");
    evt.assert_empty_param(2).expect("data");
}

#[test]
fn read_exit_is_truncated_to_snaplen() {
    let config = CaptureConfig::with_snaplen(4);
    let mut evt =
        EventTest::with_config(SyscallId::READ, Direction::Exit, config).expect("event test");
    let probe = evt.enable_capture().expect("enable");

    let file = file_with(b"0123456789");
    let mut buf = [0u8; 10];
    let _ = trigger::read(&probe, file.as_raw_fd(), &mut buf).expect("read");

    evt.disable_capture().expect("disable");
    let _ = evt.parse_event().expect("parse");
    evt.assert_numeric_param(1, 10).expect("res");
    evt.assert_bytebuf_param(2, b"0123456789", 4).expect("data");
}

#[test]
fn pwrite_and_pread_carry_offsets() {
    let mut evt = EventTest::new(SyscallId::PREAD64, Direction::Enter).expect("event test");
    let probe = evt.enable_capture().expect("enable");

    let file = tempfile::tempfile().expect("tempfile");
    let fd = file.as_raw_fd();
    assert_eq!(trigger::pwrite(&probe, fd, b"xyz", 100).expect("pwrite"), 3);
    let mut buf = [0u8; 3];
    assert_eq!(trigger::pread(&probe, fd, &mut buf, 100).expect("pread"), 3);
    assert_eq!(&buf, b"xyz");

    evt.disable_capture().expect("disable");
    assert_eq!(evt.session().records().len(), 4);

    let _ = evt.parse_event().expect("parse");
    evt.assert_header().expect("header");
    evt.assert_numeric_param(1, i64::from(fd)).expect("fd");
    evt.assert_numeric_param(2, 3).expect("size");
    evt.assert_numeric_param(3, 100).expect("pos");
    evt.assert_num_params_pushed(3).expect("count");
}

#[test]
fn close_of_invalid_fd_reports_ebadf() {
    let mut evt = EventTest::new(SyscallId::CLOSE, Direction::Exit).expect("event test");
    let probe = evt.enable_capture().expect("enable");

    let file = tempfile::tempfile().expect("tempfile");
    trigger::close(&probe, file.into_raw_fd()).expect("close");
    assert!(trigger::close(&probe, -1).is_err());

    evt.disable_capture().expect("disable");
    let matching: Vec<_> = evt
        .session()
        .records()
        .records_matching(SyscallId::CLOSE, Direction::Exit)
        .map(|raw| scap_event::parse(raw).unwrap().numeric_param(1).unwrap())
        .collect();
    assert_eq!(matching, vec![0, -i64::from(libc::EBADF)]);

    let _ = evt.parse_event().expect("parse");
    evt.assert_num_params_pushed(1).expect("count");
}

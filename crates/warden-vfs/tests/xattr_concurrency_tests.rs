//! Concurrent xattr readers never observe a half-written value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use warden_abi::{XattrFlags, XATTR_SIZE_MAX};
use warden_vfs::{Credentials, MemoryFs, Resolver};

const LEN: usize = 60 * 1024;
const ROUNDS: usize = 200;

#[test]
fn test_get_sees_old_or_new_value_during_set() {
    let fs = MemoryFs::new();
    fs.create_file("/f", 0o644).unwrap();
    let object = fs.resolve(&Credentials::root(), "/f", true).unwrap();

    let first = vec![b'a'; LEN];
    let second = vec![b'b'; LEN];
    object
        .set_xattr("user.blob", &first, XattrFlags::empty())
        .unwrap();

    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let object = object.clone();
        let done = done.clone();
        let (first, second) = (first.clone(), second.clone());
        thread::spawn(move || {
            for round in 0..ROUNDS {
                let value = if round % 2 == 0 { &second } else { &first };
                object
                    .set_xattr("user.blob", value, XattrFlags::REPLACE)
                    .unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut reads = 0;
    while !done.load(Ordering::Acquire) || reads == 0 {
        let value = object.get_xattr("user.blob", XATTR_SIZE_MAX).unwrap();
        assert!(value == first || value == second, "torn read of {} bytes", value.len());
        reads += 1;
    }

    writer.join().unwrap();
}

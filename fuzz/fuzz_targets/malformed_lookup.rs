#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes stand in for a corrupted or truncated database file.
    // Every header/slot/record offset the reader derives from such a file
    // is attacker-controlled; the only acceptable outcomes are `Some`/`None`
    // (or a constructor error), never a panic or an out-of-bounds read.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fuzz.cdb");
    {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
    }

    let db = match mcdb::Db::create(None, &path) {
        Ok(db) => db,
        Err(_) => return,
    };
    let mut h = db.handle();

    // A handful of fixed probe keys plus one derived from the fuzz input
    // itself, so the probe sometimes targets hash tables the corpus file
    // actually describes.
    let probes: [&[u8]; 4] = [b"", b"key", b"\0\0\0\0", data];
    for key in probes {
        if h.find_start(key, 0) {
            while let Some((pos, len)) = h.find_next(key, 0) {
                let _ = h.read_value(pos, len);
            }
        }
        let _ = h.get(key, b'x');
    }

    let _ = h.read_value(0, u32::MAX);
    let _ = db.refresh_check();
});

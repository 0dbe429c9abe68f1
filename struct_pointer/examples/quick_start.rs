use struct_pointer::prelude::*;

/// A tiny archive: a magic header, a little-endian entry table and the
/// entry names stored after the table, reached through address slots.
fn archive() -> Struct {
    let entry = Struct::new(|p| {
        p.order(ByteOrder::Little);
        p.u32("size")?;
        p.forward(Address::I16, false, 0, |p| {
            p.str("name")?;
            Ok(())
        })
    });

    Struct::new(move |p| {
        p.str_sized(Literal::new("ARCH"), 4)?;
        let count = p.u8("count")?;
        p.align(4, 0)?;
        p.records(&entry, "entries", count as usize)?;
        Ok(())
    })
}

fn entry(name: &str, size: u32) -> Record {
    Record::new().with("name", name).with("size", size)
}

fn main() -> Result<()> {
    println!("=== Struct Pointer Quick Start ===\n");

    let schema = archive();
    let record = Record::new().with("count", 3u8).with(
        "entries",
        vec![entry("readme.txt", 1200), entry("data.bin", 65536), entry("logo.png", 4096)],
    );

    let len = schema.length(&record)?;
    println!("Packed length: {len} bytes");

    let bytes = schema.pack_to_vec(&record)?;
    println!("Packed bytes:");
    for chunk in bytes.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {}", hex.join(" "));
    }

    let back = schema.unpack_record(&bytes)?;
    assert_eq!(back, record);
    println!("\n✓ Round trip restored {} fields", back.len());

    if let Some(Value::List(entries)) = back.get("entries") {
        for e in entries.iter().filter_map(Value::as_record) {
            let name = e.get("name").and_then(Value::as_str).unwrap_or("?");
            println!("  {name:<12} {:?}", e.get("size"));
        }
    }

    // A corrupted magic is rejected
    let mut corrupt = bytes.clone();
    corrupt[0] = b'X';
    match schema.unpack_record(&corrupt) {
        Err(e) => println!("\n✓ Corrupt header rejected: {e}"),
        Ok(_) => println!("\n✗ Corrupt header accepted"),
    }

    #[cfg(feature = "mmap")]
    {
        let path = std::env::temp_dir().join("struct_pointer_quick_start.bin");
        let written = struct_pointer::io::pack_to_file(&schema, &record, &path)?;
        let loaded = struct_pointer::io::unpack_file(&schema, &path)?;
        assert_eq!(loaded, record);
        println!("✓ Wrote and re-read {written} bytes via mmap at {}", path.display());
        std::fs::remove_file(&path).map_err(struct_pointer::struct_buffer::BufferError::from)?;
    }

    Ok(())
}

use struct_pointer::prelude::*;
use struct_pointer::struct_buffer::ByteView;

fn header() -> Struct {
    Struct::new(|p| {
        p.u8("a")?;
        p.u8s("b", 4)?;
        p.u8(Literal::new(0xFFu8))?;
        Ok(())
    })
}

#[test]
fn pack_and_unpack_with_literal() {
    let schema = header();
    let record = Record::new().with("a", 10u8).with("b", vec![1u8, 2, 3, 4]);

    let mut bytes = [0u8; 6];
    assert_eq!(schema.pack(&record, &mut bytes).unwrap(), 6);
    assert_eq!(bytes, [10, 1, 2, 3, 4, 255]);

    let mut back = Record::new();
    assert_eq!(schema.unpack(&bytes, &mut back).unwrap(), 6);
    assert_eq!(back, record);
    assert_eq!(back.len(), 2);
}

#[test]
fn literal_mismatch_fails_and_match_keeps_target() {
    let schema = Struct::new(|p| {
        p.u8("c")?;
        p.u16(Literal::new(0xCAFEu16))?;
        Ok(())
    });

    let err = schema.unpack_record(&[1, 0xCA, 0xFF]).unwrap_err();
    assert!(matches!(err, StructError::LiteralMismatch { .. }));

    let literal_only = Struct::new(|p| {
        p.u8(Literal::new(7u8))?;
        Ok(())
    });
    let mut target = Record::new().with("c", "untouched");
    literal_only.unpack(&[7], &mut target).unwrap();
    assert_eq!(target, Record::new().with("c", "untouched"));
}

#[test]
fn byte_order_switches_per_field() {
    let schema = Struct::new(|p| {
        p.u32("be")?;
        p.order("LE".parse()?);
        p.u32("le")?;
        p.order(false.into());
        p.i16("back")?;
        Ok(())
    });
    let record = Record::new()
        .with("be", 0x0102_0304u32)
        .with("le", 0x0102_0304u32)
        .with("back", -2i16);

    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [1, 2, 3, 4, 4, 3, 2, 1, 0xFF, 0xFE]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn floats_and_wide_integers() {
    let schema = Struct::new(|p| {
        p.order(ByteOrder::Little);
        p.f32("f")?;
        p.f64s("d", 2)?;
        p.u64("big")?;
        p.i64("neg")?;
        Ok(())
    });
    let record = Record::new()
        .with("f", 1.5f32)
        .with("d", vec![-0.25f64, 1e100])
        .with("big", u64::MAX)
        .with("neg", i64::MIN);

    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes.len(), 4 + 16 + 8 + 8);
    assert_eq!(bytes[..4], 1.5f32.to_le_bytes());
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn coerced_values_unpack_as_declared_type() {
    let schema = Struct::new(|p| {
        p.u16("n")?;
        p.i8s("xs", 2)?;
        Ok(())
    });
    let record = Record::new()
        .with("n", 5i64)
        .with("xs", Value::List(vec![Value::U8(1), Value::I32(-1)]));

    let bytes = schema.pack_to_vec(&record).unwrap();
    let back = schema.unpack_record(&bytes).unwrap();
    assert_eq!(back.get("n"), Some(&Value::U16(5)));
    assert_eq!(back.get("xs"), Some(&Value::from(vec![1i8, -1])));
}

#[test]
fn strings() {
    let schema = Struct::new(|p| {
        p.str("name")?;
        p.str_sized("tag", 4)?;
        p.bool("on")?;
        Ok(())
    });
    let record = Record::new()
        .with("name", "héllo")
        .with("tag", "ABCD")
        .with("on", true);

    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes.len(), "héllo".len() + 1 + 4 + 1);
    assert_eq!(bytes["héllo".len()], 0);
    assert_eq!(*bytes.last().unwrap(), 0xFF);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);

    let short = Record::new().with("name", "x").with("tag", "ABC").with("on", false);
    assert!(matches!(
        schema.length(&short),
        Err(StructError::LengthMismatch { expected: 4, found: 3, .. })
    ));
}

#[test]
fn deferred_region_keeps_its_bytes() {
    let schema = Struct::new(|p| {
        let mut region = p.defer(2)?;
        p.u8("o1")?;
        p.u8("o2")?;
        region.u8("d1")?;
        region.u8("d2")?;
        Ok(())
    });
    let record = Record::new()
        .with("o1", 3u8)
        .with("o2", 4u8)
        .with("d1", 1u8)
        .with("d2", 2u8);

    assert_eq!(schema.length(&record).unwrap(), 4);
    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [1, 2, 3, 4]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn deferred_region_is_bounded() {
    let schema = Struct::new(|p| {
        let mut region = p.defer(1)?;
        region.u16("x")?;
        Ok(())
    });
    let record = Record::new().with("x", 1u16);
    assert!(matches!(schema.length(&record), Err(StructError::OutOfWindow { .. })));
}

#[test]
fn forward_pointer_lands_on_body() {
    let schema = Struct::new(|p| {
        p.u8("tag")?;
        p.forward(Address::I16, false, 0, |p| {
            p.i32("value")?;
            Ok(())
        })?;
        p.u8("tail")?;
        Ok(())
    });
    let record = Record::new()
        .with("tag", 1u8)
        .with("value", -123_456i32)
        .with("tail", 2u8);

    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes.len(), 1 + 2 + 1 + 4);

    let address = bytes.read_at::<i16>(1, ByteOrder::Big).unwrap() as usize;
    assert_eq!(address, 4);
    assert_eq!(bytes.read_at::<i32>(address, ByteOrder::Big).unwrap(), -123_456);

    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn relative_pointer_with_offset() {
    let inner = Struct::new(|p| {
        p.u8("k")?;
        p.forward(Address::I32, true, -1, |p| {
            p.order(ByteOrder::Little);
            p.u16("v")?;
            Ok(())
        })
    });
    let outer = Struct::new(move |p| {
        p.u16(Literal::new(0xABCDu16))?;
        p.record(&inner, "inner")?;
        Ok(())
    });

    let record = Record::new().with("inner", Record::new().with("k", 9u8).with("v", 0x0102u16));
    let bytes = outer.pack_to_vec(&record).unwrap();

    // inner window starts at 2; body at 7; encoded = 7 - (2 + -1)
    assert_eq!(bytes, [0xAB, 0xCD, 9, 0, 0, 0, 6, 0x02, 0x01]);
    assert_eq!(outer.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn forward_pointer_inside_deferred_region() {
    let schema = Struct::new(|p| {
        let mut slot = p.defer(2)?;
        slot.forward(Address::I16, false, 0, |p| {
            p.u32("x")?;
            Ok(())
        })?;
        p.u8("y")?;
        Ok(())
    });
    let record = Record::new().with("x", 0x0102_0304u32).with("y", 9u8);

    assert_eq!(schema.length(&record).unwrap(), 7);
    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [0, 3, 9, 1, 2, 3, 4]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn alignment_inside_followed_body() {
    let schema = Struct::new(|p| {
        p.forward(Address::I16, false, 0, |p| {
            p.align(4, 0)?;
            p.u8("x")?;
            Ok(())
        })?;
        p.u8("y")?;
        Ok(())
    });
    let record = Record::new().with("x", 7u8).with("y", 9u8);

    assert_eq!(schema.length(&record).unwrap(), 5);
    let mut bytes = [0u8; 5];
    assert_eq!(schema.pack(&record, &mut bytes).unwrap(), 5);
    // the address marks where the body starts, before its padding
    assert_eq!(bytes, [0, 3, 9, 0, 7]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn address_overflow() {
    let schema = Struct::new(|p| {
        p.forward(Address::I16, false, 0, |p| {
            p.u8("x")?;
            Ok(())
        })?;
        p.pad(40_000)
    });
    let record = Record::new().with("x", 1u8);
    assert!(matches!(
        schema.pack_to_vec(&record),
        Err(StructError::AddressOverflow { width: Address::I16, .. })
    ));
}

#[test]
fn nested_struct_arrays() {
    let point = Struct::new(|p| {
        p.i16("x")?;
        p.i16("y")?;
        Ok(())
    });
    let shape = Struct::new(move |p| {
        p.u8("kind")?;
        p.records(&point, "list", 3)?;
        Ok(())
    });

    let point = |x: i16, y: i16| Record::new().with("x", x).with("y", y);
    let record = Record::new()
        .with("kind", 3u8)
        .with("list", vec![point(1, 2), point(3, 4), point(5, 6)]);

    let bytes = shape.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [3, 0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6]);

    let back = shape.unpack_record(&bytes).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.get("list").and_then(Value::len), Some(3));
}

#[test]
fn nested_struct_resets_byte_order() {
    let word = Struct::new(|p| {
        p.u16("w")?;
        Ok(())
    });
    let schema = Struct::new(move |p| {
        p.order(ByteOrder::Little);
        p.record(&word, "a")?;
        p.u16("b")?;
        Ok(())
    });
    let record = Record::new()
        .with("a", Record::new().with("w", 0x0102u16))
        .with("b", 0x0102u16);
    assert_eq!(schema.pack_to_vec(&record).unwrap(), [1, 2, 2, 1]);
}

#[test]
fn literal_key_on_structure_is_rejected() {
    let inner = Struct::new(|_| Ok(()));
    let schema = Struct::new(move |p| {
        p.record(&inner, Literal::new(Record::new()))?;
        Ok(())
    });
    assert!(matches!(
        schema.length(&Record::new()),
        Err(StructError::Unrecognized(_))
    ));
}

#[test]
fn alignment_and_positions() {
    let schema = Struct::new(|p| {
        p.u8("a")?;
        p.align(4, 0)?;
        assert_eq!(p.getpos(true), 4);
        p.u32("b")?;
        p.align(4, 2)?;
        p.u8("c")?;
        Ok(())
    });
    let record = Record::new().with("a", 1u8).with("b", 2u32).with("c", 3u8);
    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [1, 0, 0, 0, 0, 0, 0, 2, 0, 0, 3]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn windows_at_offsets() {
    let schema = header();
    let record = Record::new().with("a", 10u8).with("b", vec![1u8, 2, 3, 4]);

    let mut bytes = [0u8; 9];
    assert_eq!(schema.pack_at(&record, &mut bytes, 2, Some(6)).unwrap(), 8);
    assert_eq!(bytes, [0, 0, 10, 1, 2, 3, 4, 255, 0]);

    let mut back = Record::new();
    assert_eq!(schema.unpack_at(&bytes, &mut back, 2, None).unwrap(), 8);
    assert_eq!(back, record);

    assert!(matches!(
        schema.pack_at(&record, &mut bytes, 4, None),
        Err(StructError::OutOfWindow { .. })
    ));
}

#[test]
fn missing_and_mistyped_fields() {
    let schema = header();
    let missing = Record::new().with("a", 10u8);
    assert!(matches!(schema.length(&missing), Err(StructError::Shape { .. })));

    let mistyped = Record::new().with("a", "ten").with("b", vec![1u8, 2, 3, 4]);
    assert!(matches!(schema.pack_to_vec(&mistyped), Err(StructError::Shape { .. })));

    let short = Record::new().with("a", 10u8).with("b", vec![1u8, 2, 3]);
    assert!(matches!(
        schema.pack_to_vec(&short),
        Err(StructError::LengthMismatch { expected: 4, found: 3, .. })
    ));
}

#[test]
fn truncated_input() {
    let err = header().unpack_record(&[10, 1, 2]).unwrap_err();
    assert!(matches!(err, StructError::OutOfWindow { .. }));
}

#[test]
fn integer_keys() {
    let schema = Struct::new(|p| {
        p.u8(0)?;
        p.u8(1)?;
        Ok(())
    });
    let record = Record::new().with(0, 5u8).with(1, 6u8);
    let bytes = schema.pack_to_vec(&record).unwrap();
    assert_eq!(bytes, [5, 6]);
    assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
}

#[test]
fn schemas_are_shared_across_threads() {
    let schema = header();
    std::thread::scope(|scope| {
        for a in 0..4u8 {
            let schema = &schema;
            scope.spawn(move || {
                let record = Record::new().with("a", a).with("b", vec![a; 4]);
                let bytes = schema.pack_to_vec(&record).unwrap();
                assert_eq!(schema.unpack_record(&bytes).unwrap(), record);
            });
        }
    });
}

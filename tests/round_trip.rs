use flash_remoting::amf3::custom_encoder::{external_decoder, CustomEncoder};
use flash_remoting::amf3::write::AMF3Encoder;
use flash_remoting::class_def::ClassDefMapper;
use flash_remoting::{
    decode, decode_packet, encode, encode_packet, Attribute, ClassDefinition, ClientVersion,
    CodecOptions, Element, Packet, PacketHeader, PacketMessage, Value, WriteError,
};

use cookie_factory::gen_simple;
use pretty_assertions::assert_eq;
use std::ops::Deref;
use std::rc::Rc;

fn round_trip(value: &Rc<Value>, options: &CodecOptions) -> Rc<Value> {
    let bytes = encode(value, options).expect("encode failed");
    decode(&bytes, options).expect("decode failed")
}

#[test]
fn amf3_scalars_round_trip() {
    let options = CodecOptions::default().amf3();
    let values = vec![
        Value::Undefined,
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Integer(0),
        Value::Integer(-1),
        Value::Integer(0x0FFF_FFFF),
        Value::Integer(-0x1000_0000),
        Value::Number(3.25),
        Value::Number(f64::MIN),
        Value::String("hello".to_string()),
        Value::String(String::new()),
        Value::ByteArray(vec![0, 1, 2, 255]),
        Value::Date(1_234_567_890_000.0, None),
        Value::XML("<a><b/></a>".to_string(), false),
        Value::XML("<a/>".to_string(), true),
    ];
    for value in values {
        let value = Rc::new(value);
        assert_eq!(*round_trip(&value, &options), *value);
    }
}

#[test]
fn amf0_scalars_round_trip() {
    let options = CodecOptions::default();
    let values = vec![
        Value::Null,
        Value::Undefined,
        Value::Bool(true),
        Value::Number(-2.5),
        Value::String("hello".to_string()),
        Value::String("a".repeat(70_000)),
        // the amf0 encoder always writes a zero timezone word
        Value::Date(1_234_567_890_000.0, Some(0)),
        Value::XML("<a/>".to_string(), true),
    ];
    for value in values {
        let value = Rc::new(value);
        assert_eq!(*round_trip(&value, &options), *value);
    }
}

#[test]
fn amf3_graphs_round_trip() {
    let options = CodecOptions::default().amf3();

    let user = Rc::new(Value::object(
        vec![
            Element::new("name", "kuroko"),
            Element::new("age", 17),
            Element::new("tags", Value::array(vec![Rc::new(Value::String("a".to_string()))])),
        ],
        None,
    ));
    let root = Rc::new(Value::mixed_array(
        vec![Rc::clone(&user), Rc::new(Value::Null)],
        vec![Element::new("owner", Value::String("kuroko".to_string()))],
    ));

    assert_eq!(*round_trip(&root, &options), *root);
}

#[test]
fn shared_identity_survives_both_formats() {
    for options in &[CodecOptions::default(), CodecOptions::default().amf3()] {
        let shared = Rc::new(Value::object(vec![Element::new("k", 1.0)], None));
        let root = Rc::new(Value::array(vec![Rc::clone(&shared), shared]));

        let decoded = round_trip(&root, options);
        match decoded.deref() {
            Value::Array(dense, _) => {
                let dense = dense.borrow();
                assert_eq!(dense.len(), 2);
                assert!(Rc::ptr_eq(&dense[0], &dense[1]), "identity lost");
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }
}

#[test]
fn cycles_round_trip_in_both_formats() {
    for options in &[CodecOptions::default(), CodecOptions::default().amf3()] {
        let obj = Rc::new(Value::object(Vec::new(), None));
        if let Value::Object(members, _) = obj.deref() {
            members.borrow_mut().push(Element {
                name: "child".to_string(),
                value: Rc::clone(&obj),
            });
        }

        let decoded = round_trip(&obj, options);
        match decoded.deref() {
            Value::Object(members, _) => {
                let members = members.borrow();
                assert_eq!(members[0].name, "child");
                assert!(Rc::ptr_eq(&members[0].value, &decoded));
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }
}

#[test]
fn disabling_references_duplicates_shared_values() {
    let options = CodecOptions::default().amf3().without_references();
    let shared = Rc::new(Value::object(Vec::new(), None));
    let root = Rc::new(Value::array(vec![Rc::clone(&shared), shared]));

    let decoded = round_trip(&root, &options);
    match decoded.deref() {
        Value::Array(dense, _) => {
            let dense = dense.borrow();
            assert_eq!(*dense[0], *dense[1]);
            assert!(!Rc::ptr_eq(&dense[0], &dense[1]));
        }
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn explicit_wrappers_round_trip() {
    let options = CodecOptions::default().amf3();

    let collection = Rc::new(Value::ArrayCollection(Rc::new(Value::array(vec![
        Rc::new(Value::Integer(1)),
        Rc::new(Value::Integer(2)),
    ]))));
    assert_eq!(*round_trip(&collection, &options), *collection);

    let proxy = Rc::new(Value::ObjectProxy(Rc::new(Value::object(
        vec![Element::new("a", 1)],
        None,
    ))));
    assert_eq!(*round_trip(&proxy, &options), *proxy);
}

#[test]
fn implicit_wrapping_is_stable_after_one_round_trip() {
    let options = CodecOptions::default().amf3().with_collections().with_proxies();

    let plain = Rc::new(Value::array(vec![Rc::new(Value::Integer(1))]));
    let bytes = encode(&plain, &options).expect("encode failed");

    // Decoding materializes the wrapper; from then on the value is a fixpoint
    let once = decode(&bytes, &options).expect("decode failed");
    match once.deref() {
        Value::ArrayCollection(inner) => {
            assert_eq!(**inner, *plain);
        }
        other => panic!("expected a wrapper, got {:?}", other),
    }

    let bytes_again = encode(&once, &options).expect("encode failed");
    assert_eq!(bytes, bytes_again);
    assert_eq!(*decode(&bytes_again, &options).expect("decode failed"), *once);
}

#[test]
fn wrapped_graph_round_trips_under_all_flags() {
    let options = CodecOptions::default().amf3().with_collections().with_proxies();

    let root = Rc::new(Value::ArrayCollection(Rc::new(Value::array(vec![
        Rc::new(Value::Integer(1)),
        Rc::new(Value::ObjectProxy(Rc::new(Value::object(
            vec![Element::new("a", Value::Number(0.5))],
            None,
        )))),
    ]))));

    assert_eq!(*round_trip(&root, &options), *root);
}

#[test]
fn typed_objects_round_trip() {
    let options = CodecOptions::default().amf3();
    let def = ClassDefinition {
        name: "org.example.User".to_string(),
        attributes: enumset::EnumSet::empty(),
        static_properties: vec!["name".to_string(), "age".to_string()],
    };
    let obj = Rc::new(Value::object(
        vec![Element::new("name", "aomine"), Element::new("age", 16)],
        Some(def),
    ));
    assert_eq!(*round_trip(&obj, &options), *obj);
}

#[test]
fn amf0_escape_round_trips() {
    let options = CodecOptions::default();
    let value = Rc::new(Value::AMF3(Rc::new(Value::ByteArray(vec![1, 2, 3]))));
    assert_eq!(*round_trip(&value, &options), *value);
}

#[test]
fn amf0_byte_arrays_come_back_as_escaped_values() {
    let options = CodecOptions::default();
    let value = Rc::new(Value::ByteArray(vec![9, 9]));
    let decoded = round_trip(&value, &options);
    assert_eq!(
        *decoded,
        Value::AMF3(Rc::new(Value::ByteArray(vec![9, 9])))
    );
}

#[test]
fn externalizable_classes_round_trip_through_their_hooks() {
    struct SingleFieldEncoder;
    impl CustomEncoder for SingleFieldEncoder {
        fn encode(
            &self,
            elements: &[Element],
            _class_def: &Option<ClassDefinition>,
            encoder: &AMF3Encoder,
        ) -> Vec<u8> {
            let value = elements
                .iter()
                .find(|e| e.name == "data")
                .map(|e| Rc::clone(&e.value))
                .unwrap_or_else(|| Rc::new(Value::Null));
            gen_simple(encoder.write_value_element(&value), Vec::new()).unwrap_or_default()
        }
    }

    let mut mapper = ClassDefMapper::default();
    mapper.register_external(
        ClassDefinition::default_with_name("org.example.Blob".to_string()),
        external_decoder(|i, decoder| {
            let (i, value) = decoder.parse_single_element(i)?;
            Ok((i, vec![Element { name: "data".to_string(), value }]))
        }),
        Rc::new(SingleFieldEncoder),
    );

    let options = CodecOptions::default().amf3().with_mapper(Rc::new(mapper));

    let mut def = ClassDefinition::default_with_name("org.example.Blob".to_string());
    def.attributes |= Attribute::External;
    let obj = Rc::new(Value::object(
        vec![Element::new("data", "payload")],
        Some(def),
    ));

    assert_eq!(*round_trip(&obj, &options), *obj);
}

#[test]
fn encoding_an_unregistered_externalizable_fails() {
    let options = CodecOptions::default().amf3();
    let mut def = ClassDefinition::default_with_name("org.example.Mystery".to_string());
    def.attributes |= Attribute::External;
    let obj = Rc::new(Value::object(Vec::new(), Some(def)));

    match encode(&obj, &options) {
        Err(WriteError::MissingExternalEncoder) => {}
        other => panic!("expected a missing encoder error, got {:?}", other),
    }
}

#[test]
fn strict_decoding_requires_registered_aliases() {
    let lax = CodecOptions::default().amf3();
    let strict = CodecOptions::default().amf3().strict();

    let def = ClassDefinition::default_with_name("org.example.Unknown".to_string());
    let obj = Rc::new(Value::object(Vec::new(), Some(def.clone())));
    let bytes = encode(&obj, &lax).expect("encode failed");

    assert!(decode(&bytes, &lax).is_ok());
    assert!(decode(&bytes, &strict).is_err());

    let mut mapper = ClassDefMapper::default();
    mapper.register(def);
    let strict_with_mapper = strict.with_mapper(Rc::new(mapper));
    assert!(decode(&bytes, &strict_with_mapper).is_ok());
}

#[test]
fn decode_coercions_apply_to_typed_objects() {
    let mut mapper = ClassDefMapper::default();
    let def = ClassDefinition {
        name: "org.example.Point".to_string(),
        attributes: enumset::EnumSet::empty(),
        static_properties: vec!["x".to_string()],
    };
    mapper.register(def.clone());
    mapper.register_decode_coercion("org.example.Point", "x", |v| match v.deref() {
        Value::Number(n) => Rc::new(Value::Integer(*n as i32)),
        _ => v,
    });
    let options = CodecOptions::default().amf3().with_mapper(Rc::new(mapper));

    let obj = Rc::new(Value::object(
        vec![Element::new("x", Value::Number(3.0))],
        Some(def.clone()),
    ));
    let decoded = round_trip(&obj, &options);
    assert_eq!(
        *decoded,
        Value::object(vec![Element::new("x", Value::Integer(3))], Some(def))
    );
}

#[test]
fn packets_round_trip() {
    let options = CodecOptions::default();
    let packet = Packet {
        version: ClientVersion::Flash9,
        headers: vec![
            PacketHeader::new("Credentials", true, Value::object(
                vec![Element::new("userid", "k"), Element::new("password", "s")],
                None,
            )),
        ],
        messages: vec![
            PacketMessage::new(
                "EchoService.echo",
                "/1",
                Value::array(vec![Rc::new(Value::Number(1.0)), Rc::new(Value::String("two".to_string()))]),
            ),
            PacketMessage::new("/2/onResult", "", Value::Null),
        ],
    };

    let bytes = encode_packet(&packet, &options).expect("encode failed");
    let decoded = decode_packet(&bytes, &options).expect("decode failed");
    assert_eq!(decoded, packet);
}

#[test]
fn packet_byte_lengths_prefix_their_bodies() {
    let options = CodecOptions::default();
    let packet = Packet::new(vec![PacketMessage::new("t", "", Value::Bool(true))]);
    let bytes = encode_packet(&packet, &options).expect("encode failed");

    // version + counts + target + response leave the length word at offset 11
    let length = u32::from_be_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]) as usize;
    assert_eq!(length, bytes.len() - 15);
}

#[test]
fn amf3_packets_round_trip_through_the_escape() {
    let options = CodecOptions::default().amf3();
    let packet = Packet::new(vec![PacketMessage::new(
        "/1/onResult",
        "",
        Value::AMF3(Rc::new(Value::Integer(42))),
    )]);

    let bytes = encode_packet(&packet, &options).expect("encode failed");
    let decoded = decode_packet(&bytes, &options).expect("decode failed");
    assert_eq!(decoded, packet);
}

#[test]
fn errors_report_their_offset() {
    let options = CodecOptions::default().amf3();
    // an array whose single dense item is an unknown marker
    let input = [0x09, 0x03, 0x01, 0x0D];
    match decode(&input, &options) {
        Err(nom::Err::Error(e)) => assert_eq!(e.offset_in(&input), 3),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[cfg(feature = "serde")]
#[test]
fn values_serialize_to_json() {
    let value = Value::object(vec![Element::new("a", 1)], None);
    let json = serde_json::to_string(&value).expect("serialize failed");
    assert!(json.contains("\"a\""));
}

#[test]
fn amf0_undefined_and_null_stay_distinct() {
    let options = CodecOptions::default();
    assert_eq!(*round_trip(&Rc::new(Value::Undefined), &options), Value::Undefined);
    assert_eq!(*round_trip(&Rc::new(Value::Null), &options), Value::Null);
}

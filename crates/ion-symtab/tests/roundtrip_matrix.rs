use std::sync::Arc;

use ion_symtab::{
    BinaryReader, BinaryWriter, Element, IonReader, IonWriter, RawReader, ReaderOptions,
    SharedSymbolTable, SimpleCatalog, TextReader, TextWriter,
};

fn user_elements<R: RawReader>(reader: &mut IonReader<R>) -> Vec<Element> {
    let mut out = Vec::new();
    while reader.next().unwrap().is_some() {
        out.push(reader.read_element().unwrap());
    }
    out
}

const SOURCE: &str = r#"
// two contexts back to back
$ion_1_0
$ion_symbol_table::{symbols:["color", "size"]}
{color: red, size: 3, tags: [big, 'two words', $10], note: "n", data: {{AAEC}}}
shape::circle
$ion_1_0
$ion_symbol_table::{symbols:["other"]}
(other + 2.5e0 null.int true)
[$10, $4]
"#;

#[test]
fn text_to_binary_to_text_matrix() {
    let expected = user_elements(&mut IonReader::text(SOURCE));
    assert_eq!(expected.len(), 4);

    let mut reader = IonReader::text(SOURCE);
    let mut writer = IonWriter::binary();
    writer.write_values(&mut reader).unwrap();
    let bytes = writer.into_bytes().unwrap();
    assert_eq!(user_elements(&mut IonReader::binary(bytes.clone())), expected);

    let mut reader = IonReader::binary(bytes);
    let mut writer = IonWriter::text();
    writer.write_values(&mut reader).unwrap();
    let text = writer.into_string().unwrap();
    assert_eq!(user_elements(&mut IonReader::text(text)), expected);
}

#[test]
fn binary_copy_keeps_symbol_ids_matrix() {
    let mut reader = IonReader::text(SOURCE);
    let mut writer = IonWriter::binary();
    writer.write_values(&mut reader).unwrap();
    let bytes = writer.into_bytes().unwrap();

    let mut reader = IonReader::binary(bytes);
    reader.next().unwrap();
    let element = reader.read_element().unwrap();
    let color = element.as_struct().unwrap()[0].0.clone();
    assert_eq!(color.text_opt(), Some("color"));
    assert_eq!(color.sid(), Some(10));
}

#[test]
fn replay_of_consecutive_tables_matrix() {
    let mut reader = IonReader::text(
        "$ion_1_0 $ion_symbol_table::{symbols:[\"a\"]} \
         $ion_1_0 $ion_symbol_table::{symbols:[\"b\"]} $10",
    );
    let mut writer = IonWriter::text();
    writer.write_values(&mut reader).unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "$ion_1_0\n$ion_1_0\n$ion_symbol_table::{symbols: [\"b\"]}\nb"
    );
}

#[test]
fn write_value_copies_one_value_matrix() {
    let mut reader = IonReader::text("$ion_symbol_table::{symbols:[\"k\"]} {$10: [1, 2]} 3");
    reader.next().unwrap();
    let mut writer = IonWriter::with_options(TextWriter::new(), Default::default()).unwrap();
    writer.write_value(&mut reader).unwrap();
    assert_eq!(writer.into_string().unwrap(), "$ion_1_0\n{k: [1, 2]}");
}

#[test]
fn imports_survive_copy_matrix() {
    let shared = SharedSymbolTable::new("S", 2, None, ["s1", "s2", "s3"]).unwrap();
    let mut catalog = SimpleCatalog::new();
    catalog.put_table(shared).unwrap();
    let catalog = Arc::new(catalog);
    let source = "$ion_symbol_table::{imports:[{name:\"S\", version:2, max_id:3}], symbols:[\"l\"]} \
                  $10 $12 $13";

    let mut reader = IonReader::with_options(
        TextReader::from_text(source),
        ReaderOptions::default().with_catalog(catalog.clone()),
    );
    let mut writer = IonWriter::new(BinaryWriter::new());
    writer.write_values(&mut reader).unwrap();
    let bytes = writer.into_bytes().unwrap();

    let mut reader = IonReader::with_options(
        BinaryReader::from_bytes(bytes),
        ReaderOptions::default().with_catalog(catalog),
    );
    let texts: Vec<_> = user_elements(&mut reader)
        .iter()
        .map(|e| e.as_symbol().and_then(|s| s.text_opt()).map(str::to_owned))
        .collect();
    assert_eq!(
        texts,
        vec![Some("s1".to_owned()), Some("s3".to_owned()), Some("l".to_owned())]
    );
    let imported = reader.symbol_table().imported_tables();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].name(), Some("S"));
    assert_eq!(imported[0].version(), 2);
}

#[test]
fn json_bridge_matrix() {
    let json = serde_json::json!({"a": [1, 2.5, "s", true, null], "b": {"c": "d"}});
    let element = Element::from(&json);
    let mut writer = IonWriter::binary();
    writer.write_element(&element).unwrap();
    let bytes = writer.into_bytes().unwrap();
    let read = user_elements(&mut IonReader::binary(bytes));
    assert_eq!(serde_json::Value::from(&read[0]), json);
}

use std::sync::Arc;

use ion_symtab::{
    BinaryReader, BinaryWriter, Element, IonError, IonReader, IonType, IonWriter, IvmPolicy,
    LocalSymbolTable, LocalSymbolTableImports, ReaderMode, ReaderOptions, SharedSymbolTable,
    SimpleCatalog, SymbolTable, SymbolToken, TextWriter, TreeWriter, WriterOptions, WriterState,
};

fn catalog() -> (SimpleCatalog, Arc<SharedSymbolTable>) {
    let x = Arc::new(SharedSymbolTable::new("X", 1, None, ["x1", "x2"]).unwrap());
    let mut catalog = SimpleCatalog::new();
    catalog.put_table(x.clone()).unwrap();
    (catalog, x)
}

fn read_texts(bytes: Vec<u8>, catalog: SimpleCatalog) -> (Vec<String>, Vec<String>) {
    let mut reader = IonReader::with_options(
        BinaryReader::from_bytes(bytes),
        ReaderOptions::default().with_catalog(Arc::new(catalog)),
    );
    let mut texts = Vec::new();
    while reader.next().unwrap().is_some() {
        texts.push(reader.symbol_value().unwrap().text().unwrap().to_owned());
    }
    let imports = reader
        .symbol_table()
        .imported_tables()
        .iter()
        .filter_map(|t| t.name().map(str::to_owned))
        .collect();
    (texts, imports)
}

#[test]
fn round_trip_with_option_imports_matrix() {
    let (catalog, x) = catalog();
    let options = WriterOptions::default().with_imports(vec![SymbolTable::shared(x)]);
    let mut writer = IonWriter::with_options(BinaryWriter::new(), options).unwrap();
    let words = ["fresh1", "x1", "fresh2", "name", "fresh1", "x2"];
    for word in words {
        writer.write_symbol(word).unwrap();
    }
    assert_eq!(writer.symbol_table().find_symbol("x1").unwrap(), Some(10));
    assert_eq!(writer.symbol_table().find_symbol("fresh1").unwrap(), Some(12));
    assert_eq!(writer.symbol_table().find_symbol("fresh2").unwrap(), Some(13));
    let (texts, imports) = read_texts(writer.into_bytes().unwrap(), catalog);
    assert_eq!(texts, words);
    assert_eq!(imports, vec!["X".to_owned()]);
}

#[test]
fn round_trip_with_installed_table_matrix() {
    let (catalog, x) = catalog();
    let imports = LocalSymbolTableImports::with_system(
        SharedSymbolTable::system(),
        vec![SymbolTable::shared(x)],
    )
    .unwrap();
    let mut writer = IonWriter::binary();
    writer
        .set_symbol_table(SymbolTable::local(LocalSymbolTable::new(imports)))
        .unwrap();
    for word in ["x2", "local", "x1"] {
        writer.write_symbol(word).unwrap();
    }
    assert_eq!(writer.symbol_table().find_symbol("local").unwrap(), Some(12));
    let (texts, imports) = read_texts(writer.into_bytes().unwrap(), catalog);
    assert_eq!(texts, ["x2", "local", "x1"]);
    assert_eq!(imports, vec!["X".to_owned()]);
}

#[test]
fn adjacent_policy_matrix() {
    let options = WriterOptions::default().with_ivm_policy(IvmPolicy::Adjacent);
    let mut writer = IonWriter::with_options(TextWriter::new(), options).unwrap();
    writer.write_i64(1).unwrap();
    writer.write_ivm().unwrap();
    writer.write_symbol("$ion_1_0").unwrap();
    writer.write_i64(2).unwrap();
    writer.write_ivm().unwrap();
    writer.write_i64(3).unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "$ion_1_0\n1\n$ion_1_0\n2\n$ion_1_0\n3"
    );
}

#[test]
fn ivm_resets_context_matrix() {
    let mut writer = IonWriter::binary();
    writer.write_symbol("a").unwrap();
    assert!(writer.symbol_table().is_local());
    writer.write_ivm().unwrap();
    assert!(writer.symbol_table().is_system());
    writer.write_symbol("b").unwrap();
    assert_eq!(writer.symbol_table().find_symbol("b").unwrap(), Some(10));
    assert_eq!(writer.symbol_table().find_symbol("a").unwrap(), None);
    let (texts, _) = read_texts(writer.into_bytes().unwrap(), SimpleCatalog::new());
    assert_eq!(texts, ["a", "b"]);
}

#[test]
fn unsupported_marker_matrix() {
    let mut writer = IonWriter::text();
    assert_eq!(
        writer.write_symbol("$ion_1_1"),
        Err(IonError::UnsupportedVersion("$ion_1_1".to_owned()))
    );
    assert_eq!(
        writer.write_symbol("$ion_99999999999_0"),
        Err(IonError::UnsupportedVersion("$ion_99999999999_0".to_owned()))
    );
    writer.add_annotation("a");
    writer.write_symbol("$ion_1_1").unwrap();
    writer.step_in(IonType::List).unwrap();
    writer.write_symbol("$ion_1_0").unwrap();
    writer.step_out().unwrap();
    assert_eq!(
        writer.into_string().unwrap(),
        "$ion_1_0\na::$ion_1_1\n[$ion_1_0]"
    );
}

#[test]
fn diversion_matrix() {
    let (catalog, _) = catalog();
    let options = WriterOptions::default().with_catalog(Arc::new(catalog.clone()));
    let mut writer = IonWriter::with_options(BinaryWriter::new(), options).unwrap();
    writer.set_annotations(["$ion_symbol_table"]);
    writer.step_in(IonType::Struct).unwrap();
    assert_eq!(writer.state(), WriterState::DivertedToLocalTableCollector);
    assert_eq!(writer.depth(), 1);
    writer.set_field_name("imports");
    writer.step_in(IonType::List).unwrap();
    writer.step_in(IonType::Struct).unwrap();
    writer.set_field_name("name");
    writer.write_string("X").unwrap();
    writer.set_field_name("version");
    writer.write_i64(1).unwrap();
    writer.set_field_name("max_id");
    writer.write_i64(2).unwrap();
    writer.step_out().unwrap();
    writer.step_out().unwrap();
    writer.set_field_name("symbols");
    writer.step_in(IonType::List).unwrap();
    writer.write_string("s1").unwrap();
    writer.write_string("s2").unwrap();
    writer.step_out().unwrap();
    assert!(matches!(
        writer.set_symbol_table(SymbolTable::system()),
        Err(IonError::IllegalState(_))
    ));
    writer.step_out().unwrap();
    assert_eq!(writer.state(), WriterState::Direct);
    assert_eq!(writer.depth(), 0);

    let table = writer.symbol_table().clone();
    assert!(table.is_local());
    assert_eq!(table.imported_max_id(), 11);
    assert_eq!(table.find_symbol("s2").unwrap(), Some(13));

    writer.write_symbol(SymbolToken::with_sid(13)).unwrap();
    writer.write_symbol("x1").unwrap();
    writer.write_symbol("s1").unwrap();
    assert_eq!(writer.symbol_table().max_id(), 13);
    let (texts, imports) = read_texts(writer.into_bytes().unwrap(), catalog);
    assert_eq!(texts, ["s2", "x1", "s1"]);
    assert_eq!(imports, vec!["X".to_owned()]);
}

#[test]
fn diverted_append_matrix() {
    let mut writer = IonWriter::text();
    writer.set_annotations(["$ion_symbol_table"]);
    writer.step_in(IonType::Struct).unwrap();
    writer.set_field_name("symbols");
    writer.step_in(IonType::List).unwrap();
    writer.write_string("a").unwrap();
    writer.step_out().unwrap();
    writer.step_out().unwrap();

    writer.set_annotations(["$ion_symbol_table"]);
    writer.step_in(IonType::Struct).unwrap();
    writer.set_field_name("imports");
    writer.write_symbol("$ion_symbol_table").unwrap();
    writer.set_field_name("symbols");
    writer.step_in(IonType::List).unwrap();
    writer.write_string("b").unwrap();
    writer.step_out().unwrap();
    writer.step_out().unwrap();

    let table = writer.symbol_table();
    assert_eq!(table.find_symbol("a").unwrap(), Some(10));
    assert_eq!(table.find_symbol("b").unwrap(), Some(11));
}

#[test]
fn nested_symbol_table_struct_is_plain_data_matrix() {
    let mut writer = IonWriter::tree();
    writer.step_in(IonType::List).unwrap();
    writer.set_annotations(["$ion_symbol_table"]);
    writer.step_in(IonType::Struct).unwrap();
    assert_eq!(writer.state(), WriterState::Direct);
    writer.step_out().unwrap();
    writer.step_out().unwrap();
    let elements = writer.into_elements().unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(
        elements[0].as_symbol().and_then(SymbolToken::text_opt),
        Some("$ion_1_0")
    );
    let list = elements[1].as_sequence().unwrap();
    assert_eq!(list[0].annotations, vec![SymbolToken::from("$ion_symbol_table")]);
    assert_eq!(list[0].as_struct().map(<[_]>::len), Some(0));
}

#[test]
fn append_after_flush_matrix() {
    let mut writer = IonWriter::binary();
    writer.write_symbol("a").unwrap();
    writer.flush().unwrap();
    writer.write_symbol("a").unwrap();
    writer.flush().unwrap();
    writer.write_symbol("b").unwrap();
    let bytes = writer.into_bytes().unwrap();

    let mut system = IonReader::with_options(
        BinaryReader::from_bytes(bytes.clone()),
        ReaderOptions::default().with_mode(ReaderMode::System),
    );
    let mut tables = Vec::new();
    let mut values = Vec::new();
    while let Some(ion_type) = system.next().unwrap() {
        match ion_type {
            IonType::Struct => tables.push(system.read_element().unwrap()),
            _ => values.push(system.symbol_value().unwrap()),
        }
    }
    assert_eq!(tables.len(), 2);
    let append = &tables[1];
    assert_eq!(
        append.get("imports").and_then(Element::as_symbol),
        Some(&SymbolToken::new("$ion_symbol_table", 3))
    );
    let symbols = append.get("symbols").and_then(Element::as_sequence).unwrap();
    assert_eq!(symbols, &[Element::string("b")]);
    let texts: Vec<_> = values.iter().map(|v| v.text_opt()).collect();
    assert_eq!(texts, vec![Some("$ion_1_0"), Some("a"), Some("a"), Some("b")]);

    let (texts, _) = read_texts(bytes, SimpleCatalog::new());
    assert_eq!(texts, ["a", "a", "b"]);
}

#[test]
fn empty_block_emits_no_table_matrix() {
    let mut writer = IonWriter::text();
    let mut local = LocalSymbolTable::system();
    local.intern("unused").unwrap();
    writer.set_symbol_table(SymbolTable::local(local)).unwrap();
    writer.write_ivm().unwrap();
    writer.write_i64(5).unwrap();
    assert_eq!(writer.into_string().unwrap(), "$ion_1_0\n5");
}

#[test]
fn read_only_table_rejects_new_symbols_matrix() {
    let mut local = LocalSymbolTable::system();
    local.intern("known").unwrap();
    local.make_read_only();
    let mut writer = IonWriter::binary();
    writer.set_symbol_table(SymbolTable::local(local)).unwrap();
    writer.write_symbol("known").unwrap();
    assert_eq!(writer.write_symbol("unknown"), Err(IonError::ReadOnly));
    writer.set_annotations(["unknown"]);
    assert_eq!(writer.write_i64(1), Err(IonError::ReadOnly));
}

#[test]
fn misuse_matrix() {
    let mut writer = IonWriter::binary();
    assert!(matches!(writer.step_out(), Err(IonError::IllegalState(_))));
    writer.step_in(IonType::Struct).unwrap();
    assert!(matches!(writer.finish(), Err(IonError::IllegalState(_))));
    assert!(matches!(writer.write_ivm(), Err(IonError::IllegalState(_))));
    assert!(matches!(writer.write_i64(1), Err(IonError::IllegalState(_))));
    writer.set_field_name("f");
    writer.write_i64(1).unwrap();
    writer.step_out().unwrap();
    writer.finish().unwrap();

    let local = LocalSymbolTable::system();
    let options = WriterOptions::default().with_imports(vec![SymbolTable::local(local)]);
    assert!(matches!(
        IonWriter::with_options(TreeWriter::new(), options),
        Err(IonError::IllegalImport(_))
    ));
}

#[test]
fn finish_starts_a_new_segment_matrix() {
    let mut writer = IonWriter::text();
    writer.write_symbol("a").unwrap();
    writer.finish().unwrap();
    writer.write_symbol(SymbolToken::with_sid(4)).unwrap();
    assert_eq!(writer.into_string().unwrap(), "$ion_1_0\na\n$ion_1_0\nname");

    let options = WriterOptions::default().with_initial_ivm(false);
    let mut writer = IonWriter::with_options(TextWriter::new(), options).unwrap();
    writer.write_i64(7).unwrap();
    assert_eq!(writer.into_string().unwrap(), "7");
}

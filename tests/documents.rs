mod common;

use std::io::Cursor;

use chrono::{NaiveDate, NaiveTime};
use common::root_table;
use rstest::rstest;
use toml_views::tree::{ArrayFormat, TableFormat};
use toml_views::{
    dumps, dumps_with_options, from_reader, loads, loads_with_options, to_writer, Array, Date,
    DateTimeValue, ErrorKind, FormatOptions, Indent, Integer, Item, Kind, ParseOptions, Str,
    Table, Time, TomlVersion, MAX_DEPTH,
};

#[rstest]
#[case::tables("name = \"x\"\n[owner]\nage = 5\n")]
#[case::scalars("i = 0x10\nf = [1e10, -inf, 0.5]\nb = false\nn = null\n")]
#[case::strings("s = \"tab\\there \\u00e9\"\nlit = 'C:\\path'\nml = \"\"\"\nline one\nline two\"\"\"\n")]
#[case::datetimes(
    "odt = 1979-05-27T07:32:00.999999123-07:00\nd = 1979-05-27\nlt = 07:32:00\nldt = 1979-05-27 07:32:00\n"
)]
#[case::inline("point = { x = 1, y = [], z = { deep = true } }\n")]
#[case::nested_headers("[a]\ny = 2\n[a.b.c]\nx = 1\n")]
#[case::array_of_tables(
    "[[fruit]]\nname = \"apple\"\n[fruit.physical]\ncolor = \"red\"\n[[fruit]]\nname = \"banana\"\n"
)]
#[case::comments("# lead\nkey = 1 # tail\narr = [\n  # one\n  1,\n  2, # two\n]\n# on table\n[t]\n")]
#[case::dotted("site.\"google.com\" = true\nsite.owner.name = \"x\"\n")]
#[case::quoted_keys("\"a b\" = 1\n'c.d' = 2\n")]
#[case::dotted_then_plain("x.y = 1\nz = 2\n")]
#[case::dotted_inside_header("[p]\na.b = 1\nc = 2\n")]
#[case::dotted_extended_by_header("x.y = 1\n[x.z]\nw = 2\n")]
#[case::parent_defined_after_child("[a.b]\n[a]\nx = 1\n")]
#[case::parent_values_after_child("[a.b]\nx = 1\n[a]\ny = 2\n")]
fn test_round_trip(#[case] input: &str) {
    let first = loads(input).unwrap();
    let text = dumps(&first).unwrap();
    let second = loads(&text).unwrap();
    assert_eq!(first, second, "reformatted as:\n{text}");
    assert_eq!(dumps(&second).unwrap(), text);
}

#[rstest]
fn test_built_document_keeps_entry_order() {
    let root = Table::new();
    root.set("t", Table::from_items([("x", Integer::new(1))]).unwrap())
        .unwrap();
    root.set("z", Integer::new(2)).unwrap();
    let first: Item = root.into();

    let text = dumps(&first).unwrap();
    assert_eq!(text, "t.x = 1\nz = 2\n\n");
    let second = loads(&text).unwrap();
    assert_eq!(first, second);
    assert_eq!(root_table(&second).keys().unwrap(), ["t", "z"]);
}

#[rstest]
fn test_deep_keys_are_rejected() {
    let limit = MAX_DEPTH;
    let keys = |segments: usize| vec!["a"; segments].join(".");
    let dotted = |segments: usize| format!("{} = 1\n", keys(segments));

    let doc = loads(&dotted(limit)).unwrap();
    assert!(dumps(&doc).is_ok());

    for input in [
        dotted(limit + 1),
        format!("[{}]\n", keys(limit + 1)),
        format!("[a]\n{}", dotted(limit)),
        format!("t = {{ {} = [1] }}\n", keys(limit)),
    ] {
        let err = loads(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{err}");
    }
}

#[rstest]
fn test_built_document_formats() {
    let root = Table::new();
    root.set("title", Str::new("demo")).unwrap();

    let point = Table::from_items([("x", Integer::new(1)), ("y", Integer::new(2))]).unwrap();
    point.set_format(TableFormat::Inline).unwrap();
    root.set("point", point).unwrap();

    let server = Table::from_items([("ip", Str::new("10.0.0.1"))]).unwrap();
    let servers = Array::from_items([server]).unwrap();
    servers.set_format(ArrayFormat::ArrayOfTables).unwrap();
    root.set("servers", servers).unwrap();

    let owner = Table::with_comments([" who"]);
    owner
        .set("dob", Date::new(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap()).unwrap())
        .unwrap();
    root.set("owner", owner).unwrap();

    assert_eq!(
        dumps(&root.into()).unwrap(),
        "title = \"demo\"\n\
         point = { x = 1, y = 2 }\n\
         \n\
         [[servers]]\n\
         ip = \"10.0.0.1\"\n\
         \n\
         # who\n\
         [owner]\n\
         dob = 1979-05-27\n\
         \n"
    );
}

#[rstest]
fn test_implicit_parents_are_not_written() {
    let doc = loads("[a.b.c]\nx = 1\n").unwrap();
    assert_eq!(dumps(&doc).unwrap(), "[a.b.c]\nx = 1\n\n");

    let a = root_table(&doc).get("a").unwrap();
    a.as_table().unwrap().set("y", Integer::new(2)).unwrap();
    assert_eq!(
        a.as_table().unwrap().format().unwrap(),
        TableFormat::Multiline
    );
    // `b` comes first, so it is written as dotted keys ahead of `y`
    assert_eq!(dumps(&doc).unwrap(), "[a]\nb.c.x = 1\ny = 2\n\n");
}

#[rstest]
fn test_array_of_tables_falls_back_to_inline_form() {
    let doc = loads("[[p]]\nx = 1\n").unwrap();
    let p = root_table(&doc).get("p").unwrap();
    let p = p.as_array().unwrap();
    assert_eq!(p.format().unwrap(), ArrayFormat::ArrayOfTables);

    p.append(Integer::new(2)).unwrap();
    assert_eq!(p.format().unwrap(), ArrayFormat::Default);
    assert_eq!(dumps(&doc).unwrap(), "p = [{ x = 1 }, 2]\n\n");
}

#[rstest]
fn test_indent_option() {
    let doc = loads("a = [\n  # first\n  1,\n]\n").unwrap();
    let options = FormatOptions::new().with_indent(Indent::spaces(4));
    assert_eq!(
        dumps_with_options(&doc, &options).unwrap(),
        "a = [\n    # first\n    1,\n]\n\n"
    );
}

#[rstest]
fn test_non_table_root_dumps_as_value() {
    let item: Item = Array::from_items([Integer::new(1), Integer::new(2)])
        .unwrap()
        .into();
    assert_eq!(dumps(&item).unwrap(), "[1, 2]");
    assert_eq!(dumps(&Str::new("q\"").into()).unwrap(), "\"q\\\"\"");
}

#[rstest]
#[case("t = 07:32\n")]
#[case("p = {\n  a = 1,\n}\n")]
#[case("s = \"\\e\"\n")]
#[case("s = \"\\x41\"\n")]
fn test_newer_syntax_needs_v1_1(#[case] input: &str) {
    let v1_0 = ParseOptions::new().with_version(TomlVersion::V1_0);
    let err = loads_with_options(input, &v1_0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(loads(input).is_ok());
}

#[rstest]
fn test_optional_seconds_read_as_zero() {
    let doc = loads("t = 07:32\n").unwrap();
    let t = root_table(&doc).get("t").unwrap();
    assert_eq!(
        t.as_time().unwrap().value().unwrap(),
        NaiveTime::from_hms_opt(7, 32, 0).unwrap()
    );
    assert_eq!(dumps(&doc).unwrap(), "t = 07:32:00\n\n");
}

#[rstest]
fn test_null_keyword_follows_option() {
    let doc = loads("n = null\n").unwrap();
    assert_eq!(root_table(&doc).get("n").unwrap().kind(), Kind::Null);

    let strict = ParseOptions::new().with_allow_null(false);
    let err = loads_with_options("n = null\n", &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[rstest]
fn test_sub_microsecond_digits_survive() {
    let doc = loads("t = 07:32:00.123456789\nd = 1979-05-27T00:00:00.000000001Z\n").unwrap();
    let root = root_table(&doc);
    let t = root.get("t").unwrap();
    let t = t.as_time().unwrap();
    assert_eq!(t.nanoseconds().unwrap(), 789);
    assert_eq!(
        t.value().unwrap(),
        NaiveTime::from_hms_micro_opt(7, 32, 0, 123_456).unwrap()
    );

    let d = root.get("d").unwrap();
    let d = d.as_datetime().unwrap();
    assert_eq!(d.nanoseconds().unwrap(), 1);
    assert!(matches!(d.value().unwrap(), DateTimeValue::Offset(_)));

    root.set(
        "t",
        Time::with_nanoseconds(NaiveTime::from_hms_micro_opt(1, 2, 3, 4).unwrap(), 5).unwrap(),
    )
    .unwrap();
    assert!(dumps(&doc).unwrap().starts_with("t = 01:02:03.000004005\n"));
}

#[rstest]
#[case("a = 1\nb = ?\n", 2, 5)]
#[case("[t]\nx = 1\n[t]\n", 3, 1)]
#[case("a = \"open\n", 1, 11)]
fn test_syntax_errors_carry_location(
    #[case] input: &str,
    #[case] line: usize,
    #[case] column: usize,
) {
    let err = loads(input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let location = err.location().unwrap();
    assert_eq!((location.line, location.column), (line, column), "{err}");
}

#[rstest]
fn test_reader_and_writer() {
    let doc = from_reader(Cursor::new("a = 1\n[t]\nb = 'x'\n")).unwrap();
    let mut out = Vec::new();
    to_writer(&mut out, &doc).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a = 1\n\n[t]\nb = \"x\"\n\n");

    let err = from_reader(Cursor::new(vec![0x61, 0x20, 0x3d, 0x20, 0xff])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[rstest]
fn test_views_serialize_to_json() {
    let doc = loads("name = \"x\"\nports = [80, 443]\n[owner]\ndob = 1979-05-27\n").unwrap();
    assert_eq!(
        serde_json::to_value(&doc).unwrap(),
        serde_json::json!({
            "name": "x",
            "ports": [80, 443],
            "owner": { "dob": "1979-05-27" }
        })
    );
    let ports = root_table(&doc).get("ports").unwrap();
    assert_eq!(serde_json::to_string(&ports).unwrap(), "[80,443]");
}

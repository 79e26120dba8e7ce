use super::*;
use pretty_assertions::assert_eq;

fn raw(table: &str, ordinal: i32, column: &str, native_type: &str) -> RawColumn {
    RawColumn {
        schema: "Sales".into(),
        table: table.into(),
        ordinal,
        column_name: column.into(),
        native_type: native_type.into(),
        is_nullable: true,
        ..Default::default()
    }
}

fn pk(mut column: RawColumn) -> RawColumn {
    column.is_pk = true;
    column.is_nullable = false;
    column
}

fn fk(mut column: RawColumn, target: &str) -> RawColumn {
    column.is_fk = true;
    column.fk_schema = Some("Sales".into());
    column.fk_table = Some(target.into());
    column
}

fn sample() -> Vec<RawColumn> {
    vec![
        raw("Order", 3, "Note", "nvarchar(200)"),
        pk(raw("Order", 1, "OrderId", "int")),
        fk(raw("Order", 2, "CustomerId", "int"), "Customer"),
        raw("Order", 4, "InsDateTime", "datetime2"),
        pk(raw("Customer", 1, "Id", "int")),
        raw("Customer", 2, "Code", "nvarchar"),
        raw("Customer", 3, "Name", "nvarchar"),
        raw("Customer", 4, "Description", "nvarchar"),
        pk(fk(raw("CustomerExtra", 1, "CustomerId", "int"), "Customer")),
        raw("CustomerExtra", 2, "Notes", "ntext"),
    ]
}

#[test]
fn builtin_type_map() {
    assert_eq!(builtin_data_type("nvarchar"), DataType::String);
    assert_eq!(builtin_data_type("NVARCHAR(50)"), DataType::String);
    assert_eq!(builtin_data_type("[sys].[int]"), DataType::Integer);
    assert_eq!(builtin_data_type("char"), DataType::Char);
    assert_eq!(builtin_data_type("bit"), DataType::Boolean);
    assert_eq!(builtin_data_type("time"), DataType::TimeOnly);
    assert_eq!(builtin_data_type("datetimeoffset"), DataType::DateTimeOffset);
    assert_eq!(builtin_data_type("datetime2"), DataType::DateTime);
    assert_eq!(builtin_data_type("money"), DataType::Decimal);
    assert_eq!(builtin_data_type("float"), DataType::Float);
    assert_eq!(builtin_data_type("varbinary(max)"), DataType::Binary);
    assert_eq!(builtin_data_type("uniqueidentifier"), DataType::Guid);
    assert_eq!(builtin_data_type("geography"), DataType::Undefined);
}

#[test]
fn aliases_win_then_base_type() {
    let enricher = MetadataEnricher::new().with_type_aliases([("[dbo].[TFlag]", DataType::Boolean)]);
    assert_eq!(enricher.infer_data_type("TFlag", Some("tinyint")), DataType::Boolean);
    assert_eq!(enricher.infer_data_type("TCode", Some("varchar")), DataType::String);
    assert_eq!(enricher.infer_data_type("TCode", None), DataType::Undefined);
}

#[test]
fn tables_are_grouped_sorted_and_ordered() {
    let tables = MetadataEnricher::new().enrich(sample(), &[]);
    let names: Vec<_> = tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(names, vec!["Customer", "CustomerExtra", "Order"]);

    let order = &tables[2];
    let columns: Vec<_> = order.columns.iter().map(|c| c.column_name.as_str()).collect();
    assert_eq!(columns, vec!["OrderId", "CustomerId", "Note", "InsDateTime"]);
}

#[test]
fn identity_inferred_from_pk_naming() {
    let tables = MetadataEnricher::new().enrich(sample(), &[]);
    let customer = &tables[0];
    assert_eq!(customer.identity_column.as_deref(), Some("Id"));
    assert!(customer.is_entity);
    assert_eq!(customer.identifier_columns, vec!["Code"]);

    let order = &tables[2];
    assert_eq!(order.identity_column.as_deref(), Some("OrderId"));
    assert!(!order.is_entity);
    assert_eq!(order.insertable_columns, vec!["CustomerId", "Note", "InsDateTime"]);
    assert_eq!(order.updateable_columns, vec!["CustomerId", "Note"]);
}

#[test]
fn catalog_identity_flag_is_kept() {
    let mut column = raw("Log", 1, "Seq", "bigint");
    column.is_identity = true;
    let tables = MetadataEnricher::new().enrich(vec![column], &[]);
    assert_eq!(tables[0].identity_column.as_deref(), Some("Seq"));
}

#[test]
fn extension_inferred_relative_to_target_table() {
    let tables = MetadataEnricher::new().enrich(sample(), &[]);
    let extra = &tables[1];
    let key = extra.column("CustomerId").unwrap();
    assert!(key.is_extension);
    assert!(!key.is_identity);
    assert!(extra.is_extension);
    assert_eq!(extra.identifier_columns, vec!["CustomerId"]);
    assert_eq!(extra.updateable_columns, vec!["Notes"]);
}

#[test]
fn plain_foreign_key_is_not_extension() {
    let tables = MetadataEnricher::new().enrich(sample(), &[]);
    let column = tables[2].column("CustomerId").unwrap();
    assert!(column.is_fk);
    assert!(!column.is_extension);
    assert_eq!(column.fk_target(), Some(("Sales", "Customer")));
}

#[test]
fn override_replaces_present_fields_only() {
    let mut ov = CustomColumnOverride::new("main", "sales", "ORDER", "note");
    ov.is_uk = Some(true);
    ov.data_type = Some(DataType::Xml);

    let tables = MetadataEnricher::new().enrich(sample(), &[ov]);
    let note = tables[2].column("Note").unwrap();
    assert!(note.is_custom);
    assert!(note.is_uk);
    assert!(note.is_nullable);
    assert_eq!(note.data_type, DataType::Xml);
    assert_eq!(tables[2].identifier_columns, vec!["Note"]);
}

#[test]
fn override_can_add_foreign_key() {
    let mut ov = CustomColumnOverride::new("main", "Sales", "Order", "Note");
    ov.is_fk = Some(true);
    ov.fk_schema = Some("Sales".into());
    ov.fk_table = Some("Customer".into());

    let tables = MetadataEnricher::new().enrich(sample(), &[ov]);
    assert_eq!(tables[2].foreign_keys().count(), 2);
}

#[test]
fn empty_override_is_ignored() {
    let ov = CustomColumnOverride::new("main", "Sales", "Order", "Note");
    let tables = MetadataEnricher::new().enrich(sample(), &[ov]);
    assert!(!tables[2].column("Note").unwrap().is_custom);
}

#[test]
fn foreign_key_without_target_is_cleared() {
    let mut ov = CustomColumnOverride::new("main", "Sales", "Order", "Note");
    ov.is_fk = Some(true);
    ov.is_extension = Some(true);

    let tables = MetadataEnricher::new().enrich(sample(), &[ov]);
    let note = tables[2].column("Note").unwrap();
    assert!(!note.is_fk);
    assert!(!note.is_extension);
}

//! Integration tests for merge SQL generation
//!
//! Runs `DatabaseService::get_merge_sql` end to end against the mock sales
//! database: record graph resolution, statement ordering and the diff.

mod common;

use std::sync::Arc;

use dbstudio_core::{CustomColumnOverride, RecordNode, StudioError};
use indoc::indoc;
use pretty_assertions::assert_eq;

use common::{sales_database, service_for};

fn statement_count(sql: &str) -> usize {
    sql.matches("MERGE INTO").count()
}

fn position(sql: &str, needle: &str) -> usize {
    sql.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{sql}"))
}

// ============ Scenario tests ============

#[tokio::test]
async fn new_customer_matches_on_unique_email() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Customer")
        .editing()
        .with_value("Email", "a@b.com")
        .with_value("Name", "Ann");

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(result.original_sql, "");
    assert_eq!(
        result.new_sql,
        indoc! {"
            MERGE INTO [Sales].[Customer] AS T
            USING (SELECT
                NULL AS [CustomerId],
                'a@b.com' AS [Email],
                'Ann' AS [Name]
            ) AS S
            ON T.[Email] = S.[Email]
            WHEN MATCHED THEN UPDATE SET T.[Email] = S.[Email], T.[Name] = S.[Name]
            WHEN NOT MATCHED THEN INSERT ([Email], [Name]) VALUES (S.[Email], S.[Name])
            ;"}
    );
    assert!(result.diff_sql.starts_with("+ MERGE INTO [Sales].[Customer] AS T\n"));
    assert!(result.diff_sql.lines().all(|line| line.starts_with("+ ")));
}

#[tokio::test]
async fn new_dependency_is_written_first_and_referenced_by_subquery() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("Number", "SO-1")
        .with_value("Paid", "True")
        .with_dependency(
            RecordNode::new("Sales", "Customer")
                .editing()
                .with_parent_column("CustomerId")
                .with_value("Email", "new@x.com")
                .with_value("Name", "New"),
        );

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(result.original_sql, "");
    assert_eq!(
        result.new_sql,
        indoc! {"
            MERGE INTO [Sales].[Customer] AS T
            USING (SELECT
                NULL AS [CustomerId],
                'new@x.com' AS [Email],
                'New' AS [Name]
            ) AS S
            ON T.[Email] = S.[Email]
            WHEN MATCHED THEN UPDATE SET T.[Email] = S.[Email], T.[Name] = S.[Name]
            WHEN NOT MATCHED THEN INSERT ([Email], [Name]) VALUES (S.[Email], S.[Name])
            ;

            MERGE INTO [Sales].[Order] AS T
            USING (SELECT
                NULL AS [OrderId],
                'SO-1' AS [Number],
                (SELECT [CustomerId] FROM [Sales].[Customer] WHERE [Email] = 'new@x.com') AS [CustomerId],
                1 AS [Paid],
                SYSDATETIMEOFFSET() AS [UpdatedAt]
            ) AS S
            ON T.[Number] = S.[Number]
            WHEN MATCHED THEN UPDATE SET T.[Number] = S.[Number], T.[CustomerId] = S.[CustomerId], T.[Paid] = S.[Paid], T.[UpdatedAt] = S.[UpdatedAt]
            WHEN NOT MATCHED THEN INSERT ([Number], [CustomerId], [Paid], [UpdatedAt]) VALUES (S.[Number], S.[CustomerId], S.[Paid], S.[UpdatedAt])
            ;"}
    );
}

#[tokio::test]
async fn statements_are_emitted_in_post_order_at_any_depth() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "OrderLine")
        .editing()
        .with_value("Sku", "SKU-1")
        .with_value("Quantity", "3")
        .with_dependency(
            RecordNode::new("Sales", "Order")
                .editing()
                .with_parent_column("OrderId")
                .with_value("Number", "SO-2")
                .with_value("Paid", "false")
                .with_dependency(
                    RecordNode::new("Sales", "Customer")
                        .editing()
                        .with_parent_column("CustomerId")
                        .with_value("Email", "c@x.com")
                        .with_value("Name", "Cy"),
                ),
        );

    let sql = service.get_merge_sql("main", &record).await.unwrap().new_sql;

    assert_eq!(statement_count(&sql), 3);
    let customer = position(&sql, "MERGE INTO [Sales].[Customer]");
    let order = position(&sql, "MERGE INTO [Sales].[Order] ");
    let line = position(&sql, "MERGE INTO [Sales].[OrderLine]");
    assert!(customer < order && order < line);

    assert!(sql.contains(
        "(SELECT [OrderId] FROM [Sales].[Order] WHERE [Number] = 'SO-2') AS [OrderId]"
    ));
    assert!(sql.contains("ON T.[OrderId] = S.[OrderId] AND T.[Sku] = S.[Sku]"));
    assert!(sql.contains("0 AS [Paid]"));
}

#[tokio::test]
async fn lookup_only_dependency_emits_no_statement() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("Number", "SO-3")
        .with_value("CustomerId", "2")
        .with_dependency(RecordNode::new("Sales", "Customer").with_parent_column("CustomerId"));

    let sql = service.get_merge_sql("main", &record).await.unwrap().new_sql;

    assert_eq!(statement_count(&sql), 1);
    assert!(sql.contains(
        "(SELECT [CustomerId] FROM [Sales].[Customer] WHERE [Email] = 'b@b.com') AS [CustomerId]"
    ));
}

#[tokio::test]
async fn unchanged_record_has_no_diff() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("OrderId", "10")
        .with_value("Number", "SO-10")
        .with_value("CustomerId", "1")
        .with_value("Paid", "True")
        .with_value("UpdatedAt", "2030-01-01T00:00:00");

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(result.diff_sql, "");
    assert!(!result.has_changes());
    assert_eq!(result.original_sql.trim(), result.new_sql.trim());
    assert_eq!(statement_count(&result.new_sql), 1);
    assert!(result.new_sql.contains("WHERE [Email] = 'a@b.com') AS [CustomerId]"));
}

#[tokio::test]
async fn moving_to_another_parent_diffs_both_parents() {
    let database = Arc::new(sales_database());
    let (service, _) = service_for(database.clone());
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("OrderId", "10")
        .with_value("Number", "SO-10")
        .with_value("CustomerId", "2")
        .with_value("Paid", "1")
        .with_dependency(
            RecordNode::new("Sales", "Customer")
                .editing()
                .with_parent_column("CustomerId")
                .with_value("CustomerId", "2")
                .with_value("Email", "b@b.com")
                .with_value("Name", "Bea Edited"),
        );

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(statement_count(&result.original_sql), 2);
    assert!(result.original_sql.contains("'Bea' AS [Name]"));
    assert!(
        result
            .original_sql
            .contains("WHERE [Email] = 'a@b.com') AS [CustomerId]")
    );

    assert_eq!(statement_count(&result.new_sql), 2);
    assert!(result.new_sql.contains("'Bea Edited' AS [Name]"));
    assert!(result.new_sql.contains("WHERE [Email] = 'b@b.com') AS [CustomerId]"));

    let diff = &result.diff_sql;
    assert!(diff.lines().any(|l| l.starts_with("- ") && l.contains("'Bea' AS [Name]")));
    assert!(diff.lines().any(|l| l.starts_with("+ ") && l.contains("'Bea Edited' AS [Name]")));
    assert!(diff.lines().any(|l| l.starts_with("  ") && l.contains("MERGE INTO [Sales].[Order]")));

    let fetched = database.fetch_log();
    assert!(fetched.contains(&"Sales.Customer#1".to_string()));
    assert!(fetched.contains(&"Sales.Customer#2".to_string()));
}

#[tokio::test]
async fn repointed_foreign_key_looks_up_the_new_parent() {
    let database = Arc::new(sales_database());
    let (service, _) = service_for(database.clone());
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("OrderId", "10")
        .with_value("Number", "SO-10")
        .with_value("CustomerId", "2")
        .with_value("Paid", "1")
        .with_dependency(RecordNode::new("Sales", "Customer").with_parent_column("CustomerId"));

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(statement_count(&result.new_sql), 1);
    assert!(result.new_sql.contains("WHERE [Email] = 'b@b.com') AS [CustomerId]"));
    assert!(!result.new_sql.contains("2 AS [CustomerId]"));
    assert!(
        result
            .original_sql
            .contains("WHERE [Email] = 'a@b.com') AS [CustomerId]")
    );
    assert!(result.diff_sql.lines().any(|l| l.starts_with("+ ") && l.contains("'b@b.com'")));

    let fetched = database.fetch_log();
    assert!(fetched.contains(&"Sales.Customer#1".to_string()));
    assert!(fetched.contains(&"Sales.Customer#2".to_string()));
}

#[tokio::test]
async fn self_reference_terminates() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Employee")
        .editing()
        .with_value("EmployeeId", "7")
        .with_value("Code", "E7")
        .with_value("ManagerId", "7");

    let result = service.get_merge_sql("main", &record).await.unwrap();

    assert_eq!(statement_count(&result.new_sql), 1);
    assert!(result.new_sql.contains(
        "(SELECT [EmployeeId] FROM [Sales].[Employee] WHERE [Code] = 'E7') AS [ManagerId]"
    ));
    assert_eq!(result.diff_sql, "");
}

// ============ Failure tests ============

#[tokio::test]
async fn blank_record_id_is_rejected() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Employee")
        .editing()
        .with_value("EmployeeId", "  ")
        .with_value("Code", "E9");

    let err = service.get_merge_sql("main", &record).await.unwrap_err();
    assert!(matches!(err, StudioError::Validation(_)), "{err}");
}

#[tokio::test]
async fn dependency_without_parent_column_is_rejected() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Order")
        .editing()
        .with_value("Number", "SO-4")
        .with_dependency(RecordNode::new("Sales", "Customer").editing());

    let err = service.get_merge_sql("main", &record).await.unwrap_err();
    assert!(matches!(err, StudioError::Validation(_)), "{err}");
}

#[tokio::test]
async fn unknown_table_is_schema_error() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "Invoice").editing();

    let err = service.get_merge_sql("main", &record).await.unwrap_err();
    assert!(matches!(err, StudioError::Schema(_)), "{err}");
}

#[tokio::test]
async fn strict_codec_failure_fails_generation() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record = RecordNode::new("Sales", "OrderLine")
        .editing()
        .with_value("Sku", "SKU-9")
        .with_value("Quantity", "three");

    let err = service.get_merge_sql("main", &record).await.unwrap_err();
    assert!(matches!(err, StudioError::Parse { .. }), "{err}");
}

#[tokio::test]
async fn lookup_into_table_without_identity_is_configuration_error() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let mut name_to_log = CustomColumnOverride::new("main", "Sales", "Customer", "Name");
    name_to_log.is_fk = Some(true);
    name_to_log.fk_schema = Some("Sales".into());
    name_to_log.fk_table = Some("Log".into());
    service
        .define_column_config("main", vec![name_to_log])
        .await
        .unwrap();

    let record = RecordNode::new("Sales", "Customer")
        .editing()
        .with_value("CustomerId", "1")
        .with_value("Email", "a@b.com")
        .with_value("Name", "Ann");

    let err = service.get_merge_sql("main", &record).await.unwrap_err();
    assert!(matches!(err, StudioError::Configuration(_)), "{err}");
}

#[tokio::test]
async fn client_payload_deserializes_into_record_tree() {
    let (service, _) = service_for(Arc::new(sales_database()));
    let record: RecordNode = serde_json::from_str(
        r#"{
            "isEdition": true,
            "schema": "Sales",
            "table": "Customer",
            "parentColumn": null,
            "columns": { "Email": "a@b.com", "Name": null },
            "dependencies": []
        }"#,
    )
    .unwrap();

    let sql = service.get_merge_sql("main", &record).await.unwrap().new_sql;
    assert!(sql.contains("NULL AS [Name]"));
}

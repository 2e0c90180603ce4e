use std::fmt;
use std::sync::Arc;

use apm_sdk::backend::{Argument, BackendError, FunctionTable};
use apm_sdk::config::MapOptions;
use apm_sdk::kernel::{APP_NAME_OPTION, LICENSE_OPTION, NOT_INITIALISED_NOTICE, RESERVED_WORDS};
use apm_sdk::prelude::*;
use apm_sdk::telemetry::CollectingSink;
use serde_json::{Map, Value, json};

#[derive(Debug)]
struct ConnectionLost;

impl fmt::Display for ConnectionLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection lost")
    }
}

impl std::error::Error for ConnectionLost {}

fn configured_table() -> FunctionTable {
    FunctionTable::new().with_call_log().with_options(
        MapOptions::new()
            .with(APP_NAME_OPTION, "App name")
            .with(LICENSE_OPTION, "1234567890"),
    )
}

fn segment_runner(table: &FunctionTable) {
    table.register("newrelic_record_datastore_segment", |args: &mut [Argument<'_>]| {
        args[0].run_callback();
        Ok(json!("segment recorded"))
    });
}

#[test]
fn reserved_words_fail_before_the_backend() {
    let table = Arc::new(configured_table());
    let agent = NewRelicAgent::new(table.clone()).expect("agent");

    for word in RESERVED_WORDS {
        let err = agent
            .record_custom_event(word, &Map::new())
            .expect_err("event");
        assert!(err.is_invalid_argument());
        assert!(agent.add_custom_metric(word, 3.5).expect_err("metric").is_invalid_argument());
        assert!(
            agent
                .add_transaction_parameter(&format!(" {word} "), &json!("value"))
                .expect_err("parameter")
                .is_invalid_argument()
        );
    }

    assert!(table.calls().is_empty());
}

#[test]
fn words_reserved_after_construction_fail_before_the_backend() {
    let table = Arc::new(configured_table());
    table.register_value("newrelic_record_custom_event", Value::Null);
    table.register_value("newrelic_custom_metric", json!(true));
    let client = Client::new(Arc::new(NewRelicAgent::new(table.clone()).expect("agent")));
    let agent = client.agent();

    agent.reserve_words(&["checkout", "cart"]);

    assert!(agent.is_reserved_word(" cart "));
    assert!(!agent.is_reserved_word("eventType"));
    let err = agent
        .record_custom_event("checkout", &Map::new())
        .expect_err("reserved");
    assert!(err.is_invalid_argument());
    assert!(agent.add_custom_metric("cart", 1.0).expect_err("reserved").is_invalid_argument());
    assert!(table.calls().is_empty());

    agent.record_custom_event("eventType", &Map::new()).expect("no longer reserved");
    assert_eq!(table.call_count("newrelic_record_custom_event"), 1);
}

#[test]
fn end_transaction_reaches_the_backend_once() {
    let table = Arc::new(configured_table());
    table.register_value("newrelic_end_transaction", json!(true));
    let agent = NewRelicAgent::new(table.clone()).expect("agent");

    agent.end_transaction();
    assert!(agent.is_transaction_ended());
    agent.end_transaction();

    assert!(agent.is_transaction_ended());
    assert_eq!(table.call_count("newrelic_end_transaction"), 1);
}

#[test]
fn start_transaction_survives_backend_failures() {
    let table = Arc::new(configured_table());
    table.register("newrelic_start_transaction", |_args: &mut [Argument<'_>]| {
        Err(BackendError::failed("newrelic_start_transaction", "daemon unreachable"))
    });
    let agent = NewRelicAgent::new(table.clone()).expect("agent");

    let mut transaction = agent.start_transaction(false);
    assert!(transaction.is_ended());
    assert!(!transaction.is_ignored());

    let next = transaction.start(false);
    assert!(next.parameters().is_empty());
    assert_eq!(table.call_count("newrelic_start_transaction"), 2);
}

#[test]
fn non_scalar_parameters_name_their_type() {
    let table = Arc::new(configured_table());
    let agent = NewRelicAgent::new(table.clone()).expect("agent");

    let cases = [
        (json!({ "nested": true }), "object"),
        (json!([1, 2, 3]), "array"),
    ];
    for (value, type_name) in cases {
        let err = agent
            .add_transaction_parameter("payload", &value)
            .expect_err("non-scalar");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            format!("Transaction parameter value must be scalar, \"{type_name}\" given.")
        );
    }

    assert!(table.calls().is_empty());
}

#[test]
fn null_parameters_are_accepted() {
    let table = Arc::new(configured_table());
    table.register_value("newrelic_add_custom_parameter", json!(true));
    let agent = NewRelicAgent::new(table.clone()).expect("agent");

    agent
        .add_transaction_parameter("optional", &Value::Null)
        .expect("null parameter");
    assert_eq!(table.calls()[0].args, [json!("optional"), Value::Null]);
}

#[test]
fn unsupported_agent_is_neutral_and_logs_once_per_call() {
    let table = Arc::new(FunctionTable::new().with_availability(false).with_call_log());
    let sink = Arc::new(CollectingSink::new());
    let agent = NewRelicAgent::new(table.clone())
        .expect("agent")
        .with_logger(sink.clone());
    assert!(!agent.is_supported());

    let mut expected = 0;
    let mut check = |label: &str| {
        expected += 1;
        assert_eq!(sink.len(), expected, "{label}");
    };

    agent.change_application_name("Other", true);
    check("change_application_name");
    agent.capture_url_parameters(true);
    check("capture_url_parameters");
    agent.record_custom_event("event", &Map::new()).expect("event");
    check("record_custom_event");
    agent.add_custom_metric("metric", 1.0).expect("metric");
    check("add_custom_metric");
    agent.disable_automatic_browser_monitoring_scripts();
    check("disable_automatic_browser_monitoring_scripts");
    assert_eq!(agent.get_browser_monitoring_header_script(), "");
    check("get_browser_monitoring_header_script");
    assert_eq!(agent.get_browser_monitoring_footer_script(), "");
    check("get_browser_monitoring_footer_script");
    agent.end_transaction();
    check("end_transaction");
    let transaction = agent.start_transaction(false);
    check("start_transaction");
    agent.change_transaction_name("name");
    check("change_transaction_name");
    agent
        .add_transaction_parameter("name", &json!(1))
        .expect("parameter");
    check("add_transaction_parameter");
    agent.mark_transaction_as_background(true);
    check("mark_transaction_as_background");
    agent.record_transaction_exception("message", &ConnectionLost);
    check("record_transaction_exception");
    let result = agent.datastore_segment(
        &Datastore::new("MySQL", "shop", "select"),
        &SegmentQuery::new(),
        || "rows",
    );
    assert_eq!(result, "rows");
    check("add_transaction_datastore_segment");
    agent.stop_transaction_timing();
    check("stop_transaction_timing");
    agent.ignore_transaction_apdex();
    check("ignore_transaction_apdex");
    agent.ignore_transaction();
    check("ignore_transaction");
    assert!(!agent.is_transaction_sampled());
    check("is_transaction_sampled");

    assert!(!transaction.is_ignored());
    assert!(
        sink.messages()
            .iter()
            .all(|message| message == NOT_INITIALISED_NOTICE)
    );
    assert!(table.calls().is_empty());
}

#[test]
fn datastore_segments_forward_set_fields_and_return_work_results() {
    let table = Arc::new(configured_table());
    segment_runner(&table);
    let agent = NewRelicAgent::new(table.clone()).expect("agent");
    let datastore = Datastore::new("MySQL", "shop", "select")
        .with_host("db.internal")
        .with_collection("orders");

    let query = SegmentQuery::new().with_input_query_label("Doctrine");
    assert!(!agent.datastore_segment(&datastore, &query, || false));
    assert_eq!(agent.datastore_segment(&datastore, &query, || None::<u8>), None);
    let object = json!({ "id": 7, "status": "paid" });
    assert_eq!(
        agent.datastore_segment(&datastore, &query, || object.clone()),
        object
    );

    let calls = table.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0].args[1],
        json!({
            "product": "MySQL",
            "collection": "orders",
            "operation": "select",
            "host": "db.internal",
            "databaseName": "shop",
            "inputQueryLabel": "Doctrine",
        })
    );

    let full = SegmentQuery::new()
        .with_query("SELECT * FROM orders WHERE id = ?")
        .with_input_query_label("Doctrine")
        .with_input_query("findOrder");
    agent.datastore_segment(&datastore, &full, || ());
    let parameters = &table.calls()[3].args[1];
    assert_eq!(parameters["query"], json!("SELECT * FROM orders WHERE id = ?"));
    assert_eq!(parameters["inputQuery"], json!("findOrder"));
}

#[test]
fn segment_work_runs_inline_when_the_backend_lacks_the_operation() {
    let table = Arc::new(configured_table());
    let agent = NewRelicAgent::new(table.clone()).expect("agent");
    let mut runs = 0;

    let value = agent.datastore_segment(
        &Datastore::new("Redis", "0", "get"),
        &SegmentQuery::new(),
        || {
            runs += 1;
            42
        },
    );

    assert_eq!(value, 42);
    assert_eq!(runs, 1);
    assert_eq!(table.call_count("newrelic_record_datastore_segment"), 1);
}

#[test]
fn transactions_can_wrap_any_agent() {
    let table = Arc::new(configured_table());
    table.register_value("newrelic_add_custom_parameter", json!(true));
    let new_relic = NewRelicAgent::new(table.clone()).expect("agent");
    let null = NullAgent::new();

    let mut transaction = null.create_transaction(&new_relic);
    transaction.add_parameter("user", "alice").expect("parameter");

    assert_eq!(table.call_count("newrelic_add_custom_parameter"), 1);
    assert!(!transaction.agent().is_transaction_ended());
}

#[test]
fn client_facades_share_one_agent() {
    let table = Arc::new(configured_table());
    table.register_value("newrelic_get_browser_timing_header", json!("<script>h</script>"));
    table.register_value("newrelic_ignore_transaction", Value::Null);
    let client = Client::new(Arc::new(NewRelicAgent::new(table.clone()).expect("agent")));

    assert_eq!(client.browser().header_script(), "<script>h</script>");

    let mut transaction = client.transaction();
    transaction.ignore();
    assert!(transaction.is_ignored());
    assert!(!client.transaction().is_ignored());
    assert_eq!(table.call_count("newrelic_ignore_transaction"), 1);
}

#[test]
fn exceptions_reach_the_backend_with_the_error() {
    let table = Arc::new(configured_table());
    table.register("newrelic_notice_error", |args: &mut [Argument<'_>]| {
        let matches = matches!(&args[1], Argument::Error(err) if err.to_string() == "connection lost");
        Ok(Value::Bool(matches))
    });
    let client = Client::new(Arc::new(NewRelicAgent::new(table.clone()).expect("agent")));

    client.transaction().record_exception(&ConnectionLost);

    assert_eq!(
        table.calls()[0].args,
        [json!("connection lost"), json!("connection lost")]
    );
}

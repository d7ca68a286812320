use pretty_assertions::assert_eq;
use std::io::Cursor;
use xdebug_trace_studio::aggregator::{
    aggregate_trace, rank_functions, AggregationSession, FlowAnchor, FunctionAggregate, SortKey,
    TraceSummary,
};

const HEADER: &str = "Version: 3.3.1\nFile format: 4\nTRACE START [2024-01-01 10:00:00.000000]\n";

fn aggregate(body: &str) -> TraceSummary {
    aggregate_with(body, FlowAnchor::First)
}

fn aggregate_with(body: &str, anchor: FlowAnchor) -> TraceSummary {
    aggregate_trace(Cursor::new(format!("{}{}", HEADER, body)), anchor).unwrap()
}

fn entry(depth: u32, number: u32, time: &str, memory: i64, name: &str) -> String {
    format!("{}\t{}\t0\t{}\t{}\t{}\t0\t\t/app/index.php\t1\t0\n", depth, number, time, memory, name)
}

fn exit(depth: u32, number: u32, time: &str, memory: i64) -> String {
    format!("{}\t{}\t1\t{}\t{}\n", depth, number, time, memory)
}

#[test]
fn test_main_calls_foo_scenario() {
    let body = [
        entry(0, 0, "0.000100", 100, "{main}"),
        entry(1, 1, "0.000200", 200, "foo"),
        exit(1, 1, "0.000500", 400),
        exit(0, 0, "0.000900", 900),
    ]
    .concat();

    let summary = aggregate(&body);

    assert_eq!(
        summary.functions["foo"],
        FunctionAggregate {
            calls: 1,
            time: 300,
            memory: 200,
            nested_time: 0,
            nested_memory: 0,
            sequence: Some(5),
        }
    );
    assert_eq!(
        summary.functions["{main}"],
        FunctionAggregate {
            calls: 1,
            time: 800,
            memory: 800,
            nested_time: 300,
            nested_memory: 200,
            sequence: Some(4),
        }
    );
    assert_eq!(summary.functions["foo"].own_time(), 300);
    assert_eq!(summary.functions["foo"].own_memory(), 200);
    assert_eq!(summary.functions["{main}"].own_time(), 500);
    assert_eq!(summary.functions["{main}"].own_memory(), 600);
}

#[test]
fn test_direct_recursion_counts_outermost_span_only() {
    let body = [
        entry(1, 0, "0.000000", 0, "{main}"),
        entry(2, 1, "1.000000", 0, "fib"),
        entry(3, 2, "2.000000", 0, "fib"),
        entry(4, 3, "2.500000", 0, "fib"),
        exit(4, 3, "2.750000", 0),
        exit(3, 2, "3.000000", 0),
        exit(2, 1, "5.000000", 0),
        exit(1, 0, "6.000000", 0),
    ]
    .concat();

    let summary = aggregate(&body);
    let fib = &summary.functions["fib"];

    assert_eq!(fib.calls, 3);
    // Only the outermost call (1.0 -> 5.0) contributes
    assert_eq!(fib.time, 4_000_000);
    assert_eq!(fib.nested_time, 1_000_000);
    assert_eq!(fib.own_time(), 3_000_000);
    assert_eq!(summary.functions["{main}"].nested_time, 4_000_000);

    let peak = summary.stats.deepest_recursion.unwrap();
    assert_eq!(peak.function, "fib");
    assert_eq!(peak.depth, 3);
}

#[test]
fn test_indirect_recursion_is_guarded() {
    let body = [
        entry(1, 0, "0.000000", 0, "a"),
        entry(2, 1, "0.000010", 0, "b"),
        entry(3, 2, "0.000020", 0, "a"),
        exit(3, 2, "0.000030", 0),
        exit(2, 1, "0.000050", 0),
        exit(1, 0, "0.000100", 0),
    ]
    .concat();

    let summary = aggregate(&body);

    assert_eq!(summary.functions["a"].calls, 2);
    assert_eq!(summary.functions["a"].time, 100);
    assert_eq!(summary.functions["a"].nested_time, 40);
    assert_eq!(summary.functions["b"].calls, 1);
    assert_eq!(summary.functions["b"].time, 40);
    assert_eq!(summary.functions["b"].nested_time, 10);
}

#[test]
fn test_calls_equal_closed_frames_per_function() {
    let mut body = entry(1, 0, "0.000000", 0, "{main}");
    for i in 0..5 {
        let start = format!("0.{:06}", 10 + i * 10);
        let end = format!("0.{:06}", 15 + i * 10);
        body.push_str(&entry(2, i + 1, &start, 0, if i % 2 == 0 { "even" } else { "odd" }));
        body.push_str(&exit(2, i + 1, &end, 0));
    }
    body.push_str(&exit(1, 0, "0.000100", 0));

    let summary = aggregate(&body);

    assert_eq!(summary.functions["even"].calls, 3);
    assert_eq!(summary.functions["odd"].calls, 2);
    assert_eq!(summary.functions["even"].time, 15);
    assert_eq!(summary.functions["odd"].time, 10);
    assert_eq!(summary.functions["{main}"].nested_time, 25);
    assert_eq!(summary.stats.exit_events, 6);
}

#[test]
fn test_flow_anchor_first_and_last() {
    let body = [
        entry(1, 0, "0.000000", 0, "{main}"),
        entry(2, 1, "0.000001", 0, "helper"),
        exit(2, 1, "0.000002", 0),
        entry(2, 2, "0.000003", 0, "other"),
        exit(2, 2, "0.000004", 0),
        entry(2, 3, "0.000005", 0, "helper"),
        exit(2, 3, "0.000006", 0),
        exit(1, 0, "0.000007", 0),
    ]
    .concat();

    let first = aggregate_with(&body, FlowAnchor::First);
    let last = aggregate_with(&body, FlowAnchor::Last);

    assert_eq!(first.functions["helper"].sequence, Some(5));
    assert_eq!(last.functions["helper"].sequence, Some(9));

    let names: Vec<String> = rank_functions(&first.functions, SortKey::Flow)
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, ["{main}", "helper", "other"]);
}

#[test]
fn test_sort_orders_are_monotonic() {
    let mut body = entry(1, 0, "0.000000", 0, "{main}");
    let calls = [("a", 3, 7, 100), ("b", 1, 40, 20), ("c", 5, 2, 500), ("d", 2, 9, 0)];
    let mut clock = 1;
    let mut number = 1;
    for (name, count, span, memory) in calls {
        for _ in 0..count {
            body.push_str(&entry(2, number, &format!("0.{:06}", clock), 1_000, name));
            clock += span;
            body.push_str(&exit(2, number, &format!("0.{:06}", clock), 1_000 + memory));
            number += 1;
        }
    }
    body.push_str(&exit(1, 0, &format!("0.{:06}", clock + 1), 0));

    let summary = aggregate(&body);

    let by_calls = rank_functions(&summary.functions, SortKey::Calls);
    assert!(by_calls.windows(2).all(|w| w[0].calls >= w[1].calls));

    let by_time = rank_functions(&summary.functions, SortKey::Time);
    assert!(by_time.windows(2).all(|w| w[0].time >= w[1].time));

    let by_memory = rank_functions(&summary.functions, SortKey::Memory);
    assert!(by_memory.windows(2).all(|w| w[0].memory >= w[1].memory));

    let by_flow = rank_functions(&summary.functions, SortKey::Flow);
    assert!(by_flow.windows(2).all(|w| w[0].order <= w[1].order));

    for row in &by_calls {
        assert_eq!(row.own_time, row.time - row.nested_time);
        assert_eq!(row.own_memory, row.memory - row.nested_memory);
    }
}

#[test]
fn test_aggregation_is_idempotent() {
    let body = [
        entry(1, 0, "0.100000", 10, "{main}"),
        entry(2, 1, "0.200000", 20, "load"),
        entry(3, 2, "0.250000", 30, "parse"),
        exit(3, 2, "0.300000", 60),
        exit(2, 1, "0.400000", 80),
        exit(1, 0, "0.500000", 90),
    ]
    .concat();

    let first = aggregate(&body);
    let second = aggregate(&body);

    assert_eq!(first.functions, second.functions);
    assert_eq!(first.stats, second.stats);
    assert_eq!(
        rank_functions(&first.functions, SortKey::Time),
        rank_functions(&second.functions, SortKey::Time)
    );
}

#[test]
fn test_session_can_be_fed_line_by_line() {
    let mut session = AggregationSession::new(FlowAnchor::First);
    let lines = [
        "Version: 3.3.1".to_string(),
        "File format: 4".to_string(),
        "TRACE START".to_string(),
        entry(1, 0, "0.000001", 5, "{main}"),
        exit(1, 0, "0.000011", 15),
    ];
    for (index, line) in lines.iter().enumerate() {
        session.feed_line(index + 1, line);
    }
    assert_eq!(session.function_count(), 1);

    let summary = session.finish();
    assert_eq!(summary.functions["{main}"].time, 10);
    assert_eq!(summary.functions["{main}"].memory, 10);
    assert_eq!(summary.stats.header_lines, 3);
}

#[test]
fn test_negative_memory_deltas_are_kept() {
    let body = [
        entry(1, 0, "0.000000", 5_000, "{main}"),
        entry(2, 1, "0.000001", 6_000, "gc"),
        exit(2, 1, "0.000002", 1_000),
        exit(1, 0, "0.000003", 2_000),
    ]
    .concat();

    let summary = aggregate(&body);
    assert_eq!(summary.functions["gc"].memory, -5_000);
    assert_eq!(summary.functions["{main}"].nested_memory, -5_000);
    assert_eq!(summary.functions["{main}"].own_memory(), 2_000);
}

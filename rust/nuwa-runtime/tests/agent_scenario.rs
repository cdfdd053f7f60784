//! A full agent-style run: the kind of script an LLM emits against a host
//! with several tools, shared state, and a seeded scope.

use nuwa_core::Value;
use nuwa_runtime::{
    Interpreter, ParamSpec, ParamType, ReturnSpec, Scope, ToolArgs, ToolContext, ToolError,
    ToolRegistry, ToolSchema,
};
use std::sync::{Arc, Mutex};

fn schema(name: &str, description: &str, parameters: Vec<ParamSpec>, returns: ParamType) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
        returns: ReturnSpec::of(returns),
    }
}

/// A trading host: price lookup, a swap that records fills in state, and a
/// portfolio reader.
fn trading_registry(fills: &Arc<Mutex<Vec<(String, f64)>>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry
        .register(
            schema(
                "get_price",
                "Spot price for a token symbol",
                vec![ParamSpec::required("token", ParamType::String)],
                ParamType::Number,
            ),
            |args: &ToolArgs, _: &mut ToolContext<'_>| {
                match args.get("token").and_then(|v| v.as_str()) {
                    Some("BTC") => Ok(Value::Number(65000.0)),
                    Some("ETH") => Ok(Value::Number(3500.0)),
                    Some(other) => Err(ToolError::InvalidArgument(format!(
                        "no market for '{}'",
                        other
                    ))),
                    None => Err(ToolError::InvalidArgument("token must be a string".into())),
                }
            },
        )
        .unwrap();

    let sink = Arc::clone(fills);
    registry
        .register(
            schema(
                "swap",
                "Swap an amount of quote currency into a token",
                vec![
                    ParamSpec::required("token", ParamType::String),
                    ParamSpec::required("amount", ParamType::Number),
                ],
                ParamType::Object,
            ),
            move |args: &ToolArgs, ctx: &mut ToolContext<'_>| {
                let token = args
                    .get("token")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ToolError::InvalidArgument("token must be a string".into()))?
                    .to_string();
                let amount = args
                    .get("amount")
                    .and_then(|v| v.as_number())
                    .ok_or_else(|| ToolError::InvalidArgument("amount must be a number".into()))?;
                sink.lock().unwrap().push((token.clone(), amount));
                let fills_so_far = ctx
                    .state_value("fill_count")
                    .and_then(|v| v.as_number())
                    .unwrap_or(0.0);
                ctx.set_state("fill_count", Value::Number(fills_so_far + 1.0));
                let mut receipt = indexmap::IndexMap::new();
                receipt.insert("token".to_string(), Value::String(token));
                receipt.insert("amount".to_string(), Value::Number(amount));
                Ok(Value::Object(receipt))
            },
        )
        .unwrap();

    registry
}

const REBALANCE_SCRIPT: &str = r#"
// Rebalance into whichever asset is cheaper per unit of budget.
LET btc = CALL get_price { token: "BTC" }
LET eth = CALL get_price { token: "ETH" }
LET ratio = btc / eth

IF ratio > 10 THEN
    LET choice = "ETH"
ELSE
    LET choice = "BTC"
END

FOR tranche IN [100, 250] DO
    LET fill = CALL swap { token: choice, amount: tranche * budget_scale }
    PRINT(FORMAT("filled {token} for {amount}", fill))
END

PRINT(FORMAT("done after {n} orders", {n: 2}))
"#;

#[test]
fn rebalance_script_runs_end_to_end() {
    let fills: Arc<Mutex<Vec<(String, f64)>>> = Arc::default();
    let lines: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&lines);

    let mut interpreter = Interpreter::with_output(
        trading_registry(&fills),
        Box::new(move |line| sink.lock().unwrap().push(line.to_string())),
    );

    let mut seed = Scope::new();
    seed.insert("budget_scale".to_string(), Value::Number(2.0));
    let scope = interpreter.run(REBALANCE_SCRIPT, seed).unwrap();

    // btc/eth = 65000/3500 ≈ 18.57, so the script buys ETH.
    assert_eq!(scope["choice"], Value::String("ETH".into()));
    assert_eq!(scope["ratio"].as_number().unwrap(), 65000.0 / 3500.0);
    // The loop iterator is gone, its body binding survives.
    assert!(!scope.contains_key("tranche"));
    assert!(scope.contains_key("fill"));

    assert_eq!(
        *fills.lock().unwrap(),
        vec![("ETH".to_string(), 200.0), ("ETH".to_string(), 500.0)]
    );
    assert_eq!(
        *lines.lock().unwrap(),
        vec![
            "filled ETH for 200",
            "filled ETH for 500",
            "done after 2 orders",
        ]
    );

    // State accumulated across tool calls and outlives the run.
    assert_eq!(
        interpreter.registry().state().get("fill_count"),
        Some(&Value::Number(2.0))
    );
}

#[test]
fn failed_tool_aborts_midway_and_keeps_prior_effects() {
    let fills: Arc<Mutex<Vec<(String, f64)>>> = Arc::default();
    let mut interpreter = Interpreter::with_output(trading_registry(&fills), Box::new(|_| {}));

    let err = interpreter
        .run(
            "CALL swap { token: \"BTC\", amount: 10 } \
             CALL get_price { token: \"DOGE\" } \
             CALL swap { token: \"BTC\", amount: 99 }",
            Scope::new(),
        )
        .unwrap_err();

    // The first swap landed, the failing lookup stopped the third call.
    assert!(err.to_string().contains("get_price"));
    assert!(err.to_string().contains("DOGE"));
    assert_eq!(*fills.lock().unwrap(), vec![("BTC".to_string(), 10.0)]);
    assert_eq!(
        interpreter.registry().state().get("fill_count"),
        Some(&Value::Number(1.0))
    );
}

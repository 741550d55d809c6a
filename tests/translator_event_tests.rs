/// Translator tests driven by synthetic event sequences, without a parser
use duckling::compiler::ir::{Opcode, Operator, Quadruple, ValueType, UNUSED};
use duckling::compiler::symbols::SymbolKind;
use duckling::{Error, Event, EventSink, Translator};

fn start(name: &str) -> Event {
    Event::ProgramStart { name: name.into() }
}

fn declare(names: &[&str], ty: ValueType) -> Vec<Event> {
    let mut events: Vec<Event> = names
        .iter()
        .map(|n| Event::VarName { name: (*n).into() })
        .collect();
    events.push(Event::VarType { ty });
    events
}

/// Events for a single-factor expression
fn int_expr(n: i64) -> Vec<Event> {
    vec![
        Event::IntLiteral(n),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
    ]
}

/// Events for `a < b` over two int constants
fn less_than(a: i64, b: i64) -> Vec<Event> {
    vec![
        Event::IntLiteral(a),
        Event::FactorEnd,
        Event::TermEnd,
        Event::Operator(Operator::Lt),
        Event::IntLiteral(b),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
    ]
}

fn print_int(n: i64) -> Vec<Event> {
    let mut events = int_expr(n);
    events.push(Event::PrintItem);
    events
}

fn quad(op: Opcode, left: i64, right: i64, result: i64) -> Quadruple {
    Quadruple::new(op, left, right, result)
}

#[test]
fn test_precedence_and_assignment_shapes() {
    let mut events = vec![start("p")];
    events.extend(declare(&["x"], ValueType::Int));
    events.extend([
        Event::MainStart,
        Event::AssignTarget { name: "x".into() },
        Event::AssignOperator,
        Event::IntLiteral(1),
        Event::FactorEnd,
        Event::TermEnd,
        Event::Operator(Operator::Add),
        Event::IntLiteral(2),
        Event::FactorEnd,
        Event::Operator(Operator::Mul),
        Event::IntLiteral(3),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
        Event::AssignValue,
        Event::ProgramEnd,
    ]);

    let object = Translator::translate(events).unwrap();
    assert_eq!(
        object.quadruples,
        vec![
            quad(Opcode::Goto, UNUSED, UNUSED, 1),
            quad(Opcode::Mul, 7001, 7002, 4000),
            quad(Opcode::Add, 7000, 4000, 4001),
            quad(Opcode::Assign, 4001, UNUSED, 2000),
        ]
    );
    assert_eq!(object.constants.len(), 3);
}

#[test]
fn test_parenthesis_holds_back_multiplication() {
    // x = (1 + 2) * 3
    let mut events = vec![start("p")];
    events.extend(declare(&["x"], ValueType::Int));
    events.extend([
        Event::MainStart,
        Event::AssignTarget { name: "x".into() },
        Event::AssignOperator,
        Event::OpenParen,
        Event::IntLiteral(1),
        Event::FactorEnd,
        Event::TermEnd,
        Event::Operator(Operator::Add),
        Event::IntLiteral(2),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
        Event::CloseParen,
        Event::FactorEnd,
        Event::Operator(Operator::Mul),
        Event::IntLiteral(3),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
        Event::AssignValue,
        Event::ProgramEnd,
    ]);

    let object = Translator::translate(events).unwrap();
    assert_eq!(object.quadruples[1], quad(Opcode::Add, 7000, 7001, 4000));
    assert_eq!(object.quadruples[2], quad(Opcode::Mul, 4000, 7002, 4001));
}

#[test]
fn test_unary_sign_multiplies_by_interned_constant() {
    let mut events = vec![start("p")];
    events.extend(declare(&["y"], ValueType::Float));
    events.extend([
        Event::MainStart,
        Event::AssignTarget { name: "y".into() },
        Event::AssignOperator,
        Event::UnarySign { negative: true },
        Event::FloatLiteral(2.5),
        Event::UnaryEnd,
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
        Event::AssignValue,
        Event::ProgramEnd,
    ]);

    let object = Translator::translate(events).unwrap();
    assert_eq!(object.quadruples[1], quad(Opcode::Mul, 8000, 7000, 5000));
    assert_eq!(object.quadruples[2], quad(Opcode::Assign, 5000, UNUSED, 3000));
}

#[test]
fn test_if_else_backpatching() {
    let mut events = vec![start("p"), Event::MainStart];
    events.extend(less_than(1, 2));
    events.push(Event::IfGuardEnd);
    events.extend(print_int(1));
    events.push(Event::Else);
    events.extend(print_int(2));
    events.extend([Event::IfEnd, Event::ProgramEnd]);

    let object = Translator::translate(events).unwrap();
    assert_eq!(
        object.quadruples,
        vec![
            quad(Opcode::Goto, UNUSED, UNUSED, 1),
            quad(Opcode::Lt, 7000, 7001, 6000),
            quad(Opcode::GotoFalse, 6000, UNUSED, 5),
            quad(Opcode::Print, 7000, UNUSED, UNUSED),
            quad(Opcode::Goto, UNUSED, UNUSED, 6),
            quad(Opcode::Print, 7001, UNUSED, UNUSED),
        ]
    );
}

#[test]
fn test_do_while_jumps_back_to_head() {
    let mut events = vec![start("p"), Event::MainStart];
    events.extend(print_int(7));
    events.push(Event::LoopStart);
    events.extend(print_int(8));
    events.extend(less_than(1, 2));
    events.extend([Event::LoopGuardEnd, Event::ProgramEnd]);

    let object = Translator::translate(events).unwrap();
    let last = *object.quadruples.last().unwrap();
    assert_eq!(last.op, Opcode::GotoTrue);
    assert_eq!(last.result, 2);
    assert_eq!(object.quadruples[2].op, Opcode::Print);
}

#[test]
fn test_parameters_get_local_addresses_in_order() {
    let events = vec![
        start("p"),
        Event::FunctionStart { name: "f".into() },
        Event::Param {
            name: "a".into(),
            ty: ValueType::Int,
        },
        Event::Param {
            name: "b".into(),
            ty: ValueType::Float,
        },
        Event::Param {
            name: "c".into(),
            ty: ValueType::Int,
        },
        Event::VarName { name: "t".into() },
        Event::VarType {
            ty: ValueType::Float,
        },
        Event::FunctionBodyStart,
        Event::FunctionEnd,
        Event::MainStart,
    ];

    let mut translator = Translator::new();
    for event in events {
        translator.handle(event).unwrap();
    }

    let directory = translator.context().directory();
    let f = directory.function("f").unwrap();
    assert_eq!(f.address, Some(1000));
    assert_eq!(f.start, Some(1));

    let table = f.table.as_ref().unwrap();
    let addresses: Vec<(String, Option<i64>)> = table
        .iter()
        .map(|s| (s.name.clone(), s.address))
        .collect();
    assert_eq!(
        addresses,
        vec![
            ("a".to_string(), Some(10000)),
            ("b".to_string(), Some(11000)),
            ("c".to_string(), Some(10001)),
            ("t".to_string(), Some(11001)),
        ]
    );
    assert_eq!(table.lookup("t").unwrap().kind, SymbolKind::Var(ValueType::Float));
    assert_eq!(
        directory.parameters("f").unwrap(),
        vec![ValueType::Int, ValueType::Float, ValueType::Int]
    );

    translator.handle(Event::ProgramEnd).unwrap();
    let object = translator.finish().unwrap();
    let frame = object.memory.frame(1000).unwrap();
    assert_eq!((frame.ints, frame.floats), (2, 2));
    assert_eq!(object.quadruples[1], quad(Opcode::Return, UNUSED, UNUSED, UNUSED));
}

#[test]
fn test_call_sequence() {
    let mut events = vec![
        start("p"),
        Event::FunctionStart { name: "f".into() },
        Event::Param {
            name: "a".into(),
            ty: ValueType::Int,
        },
        Event::FunctionBodyStart,
        Event::FunctionEnd,
        Event::MainStart,
        Event::CallStart { name: "f".into() },
        Event::CallOpen,
    ];
    events.extend(int_expr(5));
    events.extend([Event::Argument, Event::CallEnd, Event::ProgramEnd]);

    let object = Translator::translate(events).unwrap();
    assert_eq!(
        &object.quadruples[2..],
        &[
            quad(Opcode::AllocateFrame, 1000, UNUSED, UNUSED),
            quad(Opcode::Param, 7000, UNUSED, 0),
            quad(Opcode::Call, 1000, UNUSED, 1),
        ]
    );
}

#[test]
fn test_arity_mismatch_stops_before_gosub() {
    let mut translator = Translator::new();
    let mut events = vec![
        start("p"),
        Event::FunctionStart { name: "f".into() },
        Event::Param {
            name: "a".into(),
            ty: ValueType::Int,
        },
        Event::Param {
            name: "b".into(),
            ty: ValueType::Int,
        },
        Event::FunctionBodyStart,
        Event::FunctionEnd,
        Event::MainStart,
        Event::CallStart { name: "f".into() },
        Event::CallOpen,
    ];
    events.extend(int_expr(1));
    events.push(Event::Argument);
    for event in events {
        translator.handle(event).unwrap();
    }

    let err = translator.handle(Event::CallEnd).unwrap_err();
    assert!(matches!(err, Error::InvalidType { .. }));
    assert!(translator
        .context()
        .quadruples()
        .as_slice()
        .iter()
        .all(|q| q.op != Opcode::Call));
}

#[test]
fn test_calling_a_variable() {
    let mut events = vec![start("p")];
    events.extend(declare(&["x"], ValueType::Int));
    events.extend([Event::MainStart, Event::CallStart { name: "x".into() }]);
    let err = Translator::translate(events).unwrap_err();
    assert_eq!(err, Error::Undeclared { name: "x".into() });
}

#[test]
fn test_bool_operand_in_arithmetic() {
    // (1 < 2) + 1
    let mut events = vec![start("p"), Event::MainStart, Event::OpenParen];
    events.extend(less_than(1, 2));
    events.extend([
        Event::CloseParen,
        Event::FactorEnd,
        Event::TermEnd,
        Event::Operator(Operator::Add),
        Event::IntLiteral(1),
        Event::FactorEnd,
        Event::TermEnd,
        Event::RelationalEnd,
        Event::PrintItem,
        Event::ProgramEnd,
    ]);
    // bool counts as int for arithmetic
    let object = Translator::translate(events).unwrap();
    assert_eq!(object.quadruples[2], quad(Opcode::Add, 6000, 7000, 4000));
}

#[test]
fn test_string_operand_is_invalid_operation() {
    let events = vec![
        start("p"),
        Event::MainStart,
        Event::StringLiteral("a".into()),
        Event::FactorEnd,
        Event::TermEnd,
        Event::Operator(Operator::Add),
        Event::IntLiteral(1),
        Event::FactorEnd,
        Event::TermEnd,
    ];
    let err = Translator::translate(events).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
}

#[test]
fn test_events_before_program_start() {
    let err = Translator::translate(vec![Event::MainStart]).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));
}

#[test]
fn test_events_after_program_end() {
    let events = vec![start("p"), Event::MainStart, Event::ProgramEnd, Event::MainStart];
    let err = Translator::translate(events).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));
}

#[test]
fn test_unbalanced_sequences_are_rejected() {
    // Never reached main: quadruple 0 is still open
    let err = Translator::translate(vec![start("p"), Event::ProgramEnd]).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));

    // Parenthesis never closed
    let events = vec![start("p"), Event::MainStart, Event::OpenParen, Event::ProgramEnd];
    let err = Translator::translate(events).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));

    // Program never ended
    let err = Translator::translate(vec![start("p"), Event::MainStart]).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));

    // Close without open
    let events = vec![start("p"), Event::MainStart, Event::CloseParen];
    let err = Translator::translate(events).unwrap_err();
    assert!(matches!(err, Error::CompilerError(_)));
}

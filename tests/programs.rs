// End-to-end programs through the library entry points.
use nest_bf::{run, run_to_string, Config, Error, LoopTest, StrInput, Symbol, tokenize, BracketPolicy};

/// The sample program shipped with the original web page.
const SAMPLE: &str = ">+++++++++[<++++++++>-]<.>+++++++[<++++>-]<+.+++++++..+++.[-]>++++++++[<++++>-] <.>+++++++++++[<++++++++>-]<-.--------.+++.------.--------.[-]>++++++++[<++++>-]<+.[-]++++++++++.";

const HELLO_WORLD: &str = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

#[test]
fn sample_program_prints_greeting() {
    let (_, out) = run_to_string(SAMPLE, &Config::default(), "").unwrap();
    assert_eq!(out, "Hello world!\n");
}

#[test]
fn sample_program_behaves_the_same_under_legacy_rules() {
    let (tape, out) = run_to_string(SAMPLE, &Config::legacy(), "").unwrap();
    assert_eq!(out, "Hello world!\n");
    assert_eq!(tape.cell(0), 10);
}

#[test]
fn canonical_hello_world() {
    let (_, out) = run_to_string(HELLO_WORLD, &Config::default(), "").unwrap();
    assert_eq!(out, "Hello World!\n");
}

#[test]
fn comments_do_not_change_the_result() {
    let commented = "set cell 1 to 9 > +++++++++ \n loop [ < ++++++++ > - ] print < .";
    let (_, out) = run_to_string(commented, &Config::default(), "").unwrap();
    assert_eq!(out, "H");
}

#[test]
fn balanced_program_levels_match_lexical_depth() {
    let program = tokenize("+[>[>[-]<]<]", BracketPolicy::Strict).unwrap();
    assert_eq!(program.max_depth(), 3);
    let last = program.tokens().last().unwrap();
    assert_eq!((last.symbol, last.level), (Symbol::End, 0));
}

#[test]
fn stats_report_iterations_and_depth() {
    let mut out = String::new();
    let outcome = run("+++[-]", &Config::default(), &mut out, &mut StrInput::new("")).unwrap();
    assert_eq!(outcome.stats.loop_iterations, 3);
    assert_eq!(outcome.stats.max_depth, 1);
    assert_eq!(outcome.tape.cell(0), 0);

    let deep = "+[>+[>+[>+[>+[-]<-]<-]<-]<-]";
    let outcome = run(deep, &Config::default(), &mut out, &mut StrInput::new("")).unwrap();
    assert_eq!(outcome.stats.max_depth, 5);
}

#[test]
fn loop_test_cell_choice_is_observable() {
    // The body steps right and clears cell 1. Testing the live pointer reads
    // cell 1 and stops; testing the entry cell keeps reading cell 0, which
    // the body never touches.
    let code = "++>+<[>-]";
    let (tape, _) = run_to_string(code, &Config::default(), "").unwrap();
    assert_eq!(tape.pointer(), 1);
    assert_eq!(tape.cell(0), 2);
    assert_eq!(tape.cell(1), 0);

    let mut cfg = Config::default();
    cfg.loop_test = LoopTest::EntryCell;
    cfg.capacity = 4;
    let mut interp = nest_bf::Interpreter::new(code, cfg).unwrap();
    let ctrl = nest_bf::StepControl::new(Some(1_000), Default::default());
    let err = interp
        .run_with_control(&mut String::new(), &mut StrInput::new(""), &ctrl)
        .unwrap_err();
    assert!(matches!(err, Error::StepLimitExceeded { limit: 1_000 }));
}

#[test]
fn strict_brackets_are_reported_before_running() {
    let mut out = String::new();
    let err = run("+.]", &Config::default(), &mut out, &mut StrInput::new("")).unwrap_err();
    assert!(matches!(err, Error::UnbalancedLoop { ip: 2, .. }));
    assert!(out.is_empty());
}

#[test]
fn input_is_echoed_in_reverse() {
    let mut cfg = Config::default();
    cfg.on_eof = nest_bf::EofPolicy::Zero;
    // Read until end of input, then walk back printing.
    let (_, out) = run_to_string(">,[>,]<[.<]", &cfg, "abc").unwrap();
    assert_eq!(out, "cba");
}

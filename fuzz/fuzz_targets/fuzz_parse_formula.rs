#![no_main]

use libfuzzer_sys::fuzz_target;

use formula_syntax::{inspect, lex, Node, ParseOptions, Spanned, Token};

/// Keep the harness bounded; formulas are single cells, not documents.
const MAX_INPUT_BYTES: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };

    // The scanner must always terminate with exactly one EOF.
    let lexed = lex(data);
    let eofs = lexed.tokens.iter().filter(|l| l.token == Token::Eof).count();
    assert_eq!(eofs, 1);
    assert_eq!(lexed.tokens.last().map(|l| l.token), Some(Token::Eof));

    // First byte toggles tracing so both code paths are exercised.
    let opts = ParseOptions {
        trace: data.first().is_some_and(|b| b & 1 == 1),
    };
    let parsed = formula_syntax::parse_bytes_with_options(data, &opts);

    let offsets: Vec<usize> = parsed.diagnostics().iter().map(|d| d.offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    assert!(offsets.iter().all(|&o| o <= data.len()));

    // Node extents stay inside the buffer. A missing `)` takes the EOF position, so a closing
    // bound may sit one past the end.
    inspect(Node::Expr(&parsed.root), |node| {
        let span = node.span();
        assert!(span.start <= span.end && span.end <= data.len() + 1);
        true
    });

    // Parsing is a pure function of the input.
    assert_eq!(parsed, formula_syntax::parse_bytes_with_options(data, &opts));

    let _ = formula_syntax::parse_parameters(data, &opts);
});

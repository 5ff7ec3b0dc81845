use criterion::{criterion_group, criterion_main, Criterion};
use ember::{
    lexer::{self, Lexer, SUGGESTED_TOKENS_CAPACITY},
    token::TokenKind,
};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/big.em");

fn lexer_eager(input: &str, tokens: &mut Vec<ember::token::Token>) {
    lexer::lex(input, tokens);
    black_box(tokens.len());
}

fn lexer_incremental(input: &str) {
    let mut lexer = Lexer::new(input);
    let mut i = 0;
    loop {
        let token = lexer.next_token();
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
        i += 1;
    }
    black_box(i);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY * 2);
    c.bench_function("eager", |b| {
        b.iter(|| {
            tokens.clear();
            lexer_eager(black_box(INPUT), &mut tokens);
        });
    });
    c.bench_function("incremental", |b| {
        b.iter(|| lexer_incremental(black_box(INPUT)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

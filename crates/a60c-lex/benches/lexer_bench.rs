//! Lexer throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use a60c_lex::{Delim, TokenWindow};
use a60c_util::Handler;

const SAMPLE: &str = "\
begin
   integer i, j, n; real s;
   n := 50; s := 0.0;
   for i := 1 step 1 until 50 do
      for j := 1 step 1 until 10 do
         s := s + i * j / 2.5#1;
   if s > 0 then outreal(1, s) else outinteger(1, n)
end
";

fn bench_lexer(c: &mut Criterion) {
    let source: String = SAMPLE.repeat(50);
    c.bench_function("lex_tokens", |b| {
        b.iter(|| {
            let mut diag = Handler::new("bench.alg", 0, true, false);
            let mut w = TokenWindow::new(black_box(&source));
            let mut count = 0usize;
            loop {
                w.advance(&mut diag).unwrap();
                if w.cur().kind.is_delim(Delim::Eof) {
                    break;
                }
                count += 1;
            }
            black_box(count)
        })
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);

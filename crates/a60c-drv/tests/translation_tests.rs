//! End-to-end translation tests through the driver library.

use std::fs;

use a60c_drv::{translate, Config};
use tempfile::tempdir;

const PRIMES: &str = "\
begin
FirstFiveHundredPrimes:
   begin
      integer j, k, n, q, r; integer array prime[1:500];
p1:   prime[1] := 2; n := 3; j := 1;
p2:   j := j + 1; prime[j] := n;
p3:   if j = 500 then go to p9;
p4:   n := n + 2;
p5:   k := 2;
p6:   q := n % prime[k]; r := n - q * prime[k];
      if r = 0 then go to p4;
p7:   if q <= prime[k] then go to p2;
p8:   k := k + 1; go to p6;
p9:   outstring(1, \"First Five Hundred Primes\\n\");
      for k := 1 step 1 until 50 do
      begin
         for j := 1 step 1 until 10 do
         begin
            integer p;
            p := prime[j + 50 * (k - 1)];
            if p < 1000 then outchar(1, \"0\", 1);
            if p < 100 then outchar(1, \"0\", 1);
            if p < 10 then outchar(1, \"0\", 1);
            outinteger(1, p)
         end;
         outstring(1, \"\\n\")
      end
   end
end
";

/// Translates `src` with the given config pointing at temp files and
/// returns the emitted C.
fn run(src: &str, mut cfg: Config) -> String {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("prog.alg");
    let output = dir.path().join("prog.c");
    fs::write(&input, src).expect("write input");
    cfg.input = Some(input);
    cfg.output = Some(output.clone());
    assert!(translate(&cfg).expect("io"), "translation reported errors");
    fs::read_to_string(&output).expect("read output")
}

fn default_cfg() -> Config {
    Config {
        timestamp: false,
        nowarn: true,
        ..Config::default()
    }
}

#[test]
fn test_primes_program_translates() {
    let c = run(PRIMES, default_cfg());
    assert!(c.contains("#include \"algol.h\""));
    assert!(c.contains("alloc_array('i', 1, 1, 500);"));
    assert!(c.contains("struct dsa_main_program_0"));
    // two nested for statements extrude two sigma routines
    assert!(c.contains("static void _sigma_1(void)"));
    assert!(c.contains("static void _sigma_2(void)"));
    // the label block dispatches non-local go to
    assert!(c.contains("switch (setjmp("));
    assert!(c.contains("int main(void)"));
    assert!(c.trim_end().ends_with("/* eof */"));
}

#[test]
fn test_line_width_default() {
    let c = run(PRIMES, default_cfg());
    for line in c.lines() {
        assert!(line.len() <= 72, "line exceeds 72 columns: {:?}", line);
    }
}

#[test]
fn test_line_width_configurable() {
    let mut cfg = default_cfg();
    cfg.width = 100;
    let c = run(PRIMES, cfg);
    for line in c.lines() {
        assert!(line.len() <= 100, "line exceeds 100 columns: {:?}", line);
    }
}

#[test]
fn test_reruns_are_byte_identical() {
    let a = run(PRIMES, default_cfg());
    let b = run(PRIMES, default_cfg());
    assert_eq!(a, b);
}

#[test]
fn test_timestamp_block_present_by_default() {
    let mut cfg = default_cfg();
    cfg.timestamp = true;
    let c = run("begin outinteger(1, 5) end\n", cfg);
    assert!(c.contains("/* source file: "));
    assert!(c.contains("/* object file: "));
}

#[test]
fn test_timestamp_suppressed() {
    let c = run("begin outinteger(1, 5) end\n", default_cfg());
    assert!(!c.contains("/* source file: "));
}

#[test]
fn test_debug_dump_embedded() {
    let mut cfg = default_cfg();
    cfg.debug = true;
    let c = run("begin outinteger(1, 5) end\n", cfg);
    assert!(c.starts_with("#if 0 /* start of translator debug output */"));
    assert!(c.contains("|begin|"));
    assert!(c.contains("|outinteger|"));
    assert!(c.contains("#endif /* end of translator debug output */"));
}

#[test]
fn test_own_counter_survives_calls() {
    let src = "\
begin
   procedure bump;
   begin
      own integer count;
      count := count + 1;
      outinteger(1, count)
   end;
   bump; bump
end
";
    let c = run(src, default_cfg());
    assert!(c.contains("static int count_6 = 0;"));
    assert!(c.contains("count_6 = count_6 + 1;"));
}

#[test]
fn test_failed_translation_reports_false() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("bad.alg");
    let output = dir.path().join("bad.c");
    fs::write(&input, "begin x := 1 end\n").expect("write input");
    let cfg = Config {
        input: Some(input),
        output: Some(output.clone()),
        ..default_cfg()
    };
    assert!(!translate(&cfg).expect("io"));
}

#[test]
fn test_missing_input_is_io_error() {
    let cfg = Config {
        input: Some("/nonexistent/missing.alg".into()),
        ..default_cfg()
    };
    assert!(translate(&cfg).is_err());
}

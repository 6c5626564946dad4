//! a60c-drv - Driver orchestration for the a60c translator.
//!
//! The driver loads the source (a file, or standard input) into
//! memory once, runs the first pass (block tree, declarations,
//! builtin resolution), stops if it produced errors, emits the file
//! prologue, prototypes, and DSA structs, runs the second pass
//! (semantic checks and body emission), appends the startup code when
//! a main program was present, and finally formats and writes the
//! assembled output.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use a60c_gen::{emit_dsa_structs, emit_forward_decls, write_formatted};
use a60c_par::Translator;
use a60c_util::Handler;

/// Everything the command line configures.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input path; `None` reads standard input. Either way the
    /// source is scanned twice (from memory).
    pub input: Option<PathBuf>,
    /// Output path; `None` writes standard output.
    pub output: Option<PathBuf>,
    /// Embed the pass-1 token dump into the output.
    pub debug: bool,
    /// Error ceiling (0 = unbounded).
    pub errmax: u8,
    /// Output line width target (50..=255).
    pub width: u8,
    /// Include the timestamp block in the output header.
    pub timestamp: bool,
    /// Suppress warnings.
    pub nowarn: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            debug: false,
            errmax: 0,
            width: 72,
            timestamp: true,
            nowarn: false,
        }
    }
}

fn read_source(cfg: &Config) -> Result<(String, String)> {
    match &cfg.input {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("unable to open input file `{}'", path.display()))?;
            Ok((path.display().to_string(), text))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("unable to read standard input")?;
            Ok(("(stdin)".to_string(), text))
        }
    }
}

/// Translates one module. Returns `Ok(true)` on success, `Ok(false)`
/// when the source had errors (already reported on standard error),
/// and `Err` for I/O failures.
pub fn translate(cfg: &Config) -> Result<bool> {
    assert!((50..=255).contains(&(cfg.width as u16)));
    let (infilename, src) = read_source(cfg)?;
    let outfilename = cfg
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(stdout)".to_string());

    let diag = Handler::new(&infilename, cfg.errmax, cfg.nowarn, cfg.debug);
    let mut tr = Translator::new(&src, diag);

    tracing::info!(file = %infilename, "first pass");
    let is_main = match tr.run_pass_one() {
        Ok(m) => m,
        Err(_) => return Ok(false),
    };
    let errs = tr.diag.error_count();
    if errs > 0 {
        let msg = if errs == 1 {
            "one error detected on the first pass; translation terminated".to_string()
        } else {
            format!(
                "{} errors detected on the first pass; translation terminated",
                errs
            )
        };
        let _ = tr.diag.error(msg);
        return Ok(false);
    }

    // interlude: prologue, prototypes, and DSA structs precede the
    // translated bodies
    tracing::info!("emitting declarations");
    tr.prepare_pass_two();
    tr.emit.append(format!("/* {} */\n", outfilename));
    tr.emit.append("\n");
    tr.emit.append(format!(
        "/* generated by a60c, an Algol 60 to C translator, version {} */\n",
        env!("CARGO_PKG_VERSION")
    ));
    if cfg.timestamp {
        let now = chrono::Local::now();
        tr.emit
            .append(format!("/* {} */\n", now.format("%a %b %e %H:%M:%S %Y")));
        tr.emit.append(format!("/* source file: {} */\n", infilename));
        tr.emit.append(format!("/* object file: {} */\n", outfilename));
    }
    tr.emit.append("\n");
    tr.emit.append("#include \"algol.h\"\n");
    tr.emit.append("\n");
    emit_forward_decls(&tr.table, &mut tr.emit);
    emit_dsa_structs(&mut tr.table, &mut tr.emit);

    tracing::info!("second pass");
    if tr.run_pass_two().is_err() {
        return Ok(false);
    }
    let errs = tr.diag.error_count();
    if errs > 0 {
        let msg = if errs == 1 {
            "one error detected on the second pass; translation terminated".to_string()
        } else {
            format!(
                "{} errors detected on the second pass; translation terminated",
                errs
            )
        };
        let _ = tr.diag.error(msg);
        return Ok(false);
    }
    if is_main {
        tr.emit_startup_code();
    }
    tr.emit.append("/* eof */\n");

    // format and write the assembled output
    tracing::info!(file = %outfilename, "writing output");
    match &cfg.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("unable to open output file `{}'", path.display()))?;
            let mut out = BufWriter::new(file);
            write_output(cfg, &tr, &mut out)?;
            out.flush().context("write error on output file")?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_output(cfg, &tr, &mut out)?;
            out.flush().context("write error on standard output")?;
        }
    }
    Ok(true)
}

fn write_output<W: Write>(cfg: &Config, tr: &Translator, out: &mut W) -> Result<()> {
    if cfg.debug {
        writeln!(out, "#if 0 /* start of translator debug output */")?;
        writeln!(out)?;
        for line in tr.diag.dump_lines() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
        writeln!(out, "#endif /* end of translator debug output */")?;
        writeln!(out)?;
    }
    write_formatted(&tr.emit, cfg.width as usize, out).context("write error")?;
    Ok(())
}

//! a60c-par - The two-pass recursive-descent parser of the a60c
//! translator.
//!
//! One parsing routine exists per grammar non-terminal, and the same
//! routines drive both passes over the source. On the first pass they
//! build the block tree and capture declarations; on the second pass
//! they perform the semantic checks and assemble output code. Where a
//! token sequence is ambiguous between a subscripted variable and a
//! switch designator, the first pass always parses a subscripted
//! variable (identifier kinds are not known yet) and the second pass
//! branches on the identifier's flags.
//!
//! All translation state lives in the [`Translator`] context: the
//! token window, the symbol table, the output rope, and the auxiliary
//! counters used to form unique emitted names (`_thunk_k`,
//! `_sigma_k`, `_gamma_k`/`_omega_k`).

mod args;
mod decl;
mod expr;
mod stmt;

#[cfg(test)]
mod edge_cases;

use a60c_gen::Code;
use a60c_lex::{Delim, TokenKind, TokenWindow};
use a60c_sym::{resolve, IdentFlags, IdentId, SymbolTable};
use a60c_util::{Handler, Outcome, Pass};

/// The complete state of one translation.
pub struct Translator<'a> {
    src: &'a str,
    pub diag: Handler,
    pub table: SymbolTable,
    /// Final output code; inert until the second pass begins.
    pub emit: Code,
    toks: TokenWindow<'a>,
    pass: Pass,

    /// Counters forming unique emitted names (second pass only).
    thunk_count: u32,
    label_count: u32,
    for_count: u32,

    /// Shared thunks for common constant actual parameters
    /// (0 = not generated yet).
    thunk_real0: u32,
    thunk_real1: u32,
    thunk_int0: u32,
    thunk_int1: u32,
    thunk_false: u32,
    thunk_true: u32,

    /// Set while a bound expression of an array declaration is being
    /// parsed (Modified Report 5.2.4.2 check).
    array_bound: bool,
}

impl<'a> Translator<'a> {
    pub fn new(src: &'a str, diag: Handler) -> Self {
        Self {
            src,
            diag,
            table: SymbolTable::new(),
            emit: Code::new(false),
            toks: TokenWindow::new(src),
            pass: Pass::First,
            thunk_count: 0,
            label_count: 0,
            for_count: 0,
            thunk_real0: 0,
            thunk_real1: 0,
            thunk_int0: 0,
            thunk_int1: 0,
            thunk_false: 0,
            thunk_true: 0,
            array_bound: false,
        }
    }

    /// Runs the first pass: scope discovery, declaration capture, and
    /// builtin resolution. Returns whether a main program was seen.
    pub fn run_pass_one(&mut self) -> Outcome<bool> {
        self.pass = Pass::First;
        self.diag.set_pass(Pass::First);
        self.table.set_pass(Pass::First);
        self.entire_module()
    }

    /// Switches the translator to the second pass; from here on code
    /// fragments are live and accumulate into `emit`.
    pub fn prepare_pass_two(&mut self) {
        self.pass = Pass::Second;
        self.diag.set_pass(Pass::Second);
        self.table.set_pass(Pass::Second);
        self.emit = Code::new(true);
    }

    /// Runs the second pass: semantic checks and code emission.
    pub fn run_pass_two(&mut self) -> Outcome<bool> {
        self.entire_module()
    }

    // =====================================================================
    // Pass and token helpers
    // =====================================================================

    #[inline]
    pub(crate) fn first(&self) -> bool {
        self.pass.is_first()
    }

    #[inline]
    pub(crate) fn second(&self) -> bool {
        self.pass.is_second()
    }

    #[inline]
    pub(crate) fn t_delim(&self, d: Delim) -> bool {
        self.toks.cur().kind.is_delim(d)
    }

    #[inline]
    pub(crate) fn t_is_ident(&self) -> bool {
        matches!(self.toks.cur().kind, TokenKind::Ident(_))
    }

    #[inline]
    pub(crate) fn t_is_int(&self) -> bool {
        matches!(self.toks.cur().kind, TokenKind::Int(_))
    }

    #[inline]
    pub(crate) fn t_is_string(&self) -> bool {
        matches!(self.toks.cur().kind, TokenKind::Str(_))
    }

    /// Image of the current token (cloned; images are short).
    #[inline]
    pub(crate) fn t_image(&self) -> String {
        self.toks.cur().kind.image().to_string()
    }

    /// Source line where the current token begins.
    #[inline]
    pub(crate) fn t_line(&self) -> u32 {
        self.toks.cur().line
    }

    #[inline]
    pub(crate) fn t_kind(&self) -> &TokenKind {
        &self.toks.cur().kind
    }

    pub(crate) fn prev_is_delim(&self, d: Delim) -> bool {
        self.toks.prev().kind.is_delim(d)
    }

    pub(crate) fn advance(&mut self) -> Outcome<()> {
        self.toks.advance(&mut self.diag)
    }

    /// Fills the lookahead slot.
    pub(crate) fn peek(&mut self) -> Outcome<()> {
        self.toks.peek(&mut self.diag)?;
        Ok(())
    }

    pub(crate) fn ahead_is_delim(&self, d: Delim) -> bool {
        matches!(self.toks.ahead(), Some(t) if t.kind.is_delim(d))
    }

    pub(crate) fn ahead_is_ident(&self) -> bool {
        matches!(self.toks.ahead(), Some(t) if matches!(t.kind, TokenKind::Ident(_)))
    }

    pub(crate) fn error(&mut self, msg: impl std::fmt::Display) -> Outcome<()> {
        self.diag.error(msg)
    }

    pub(crate) fn warning(&mut self, msg: impl std::fmt::Display) {
        self.diag.warning(msg)
    }

    /// Recovery: consume tokens up to the next synchronizing
    /// delimiter (`;`, `else`, `end`, or end of file).
    pub(crate) fn skip_to_statement_end(&mut self) -> Outcome<()> {
        while !(self.t_delim(Delim::Eof)
            || self.t_delim(Delim::Semicolon)
            || self.t_delim(Delim::Else)
            || self.t_delim(Delim::End))
        {
            self.advance()?;
        }
        Ok(())
    }

    /// Recovery within declarations: consume tokens up to the next
    /// semicolon.
    pub(crate) fn skip_to_semicolon(&mut self) -> Outcome<()> {
        while !(self.t_delim(Delim::Eof) || self.t_delim(Delim::Semicolon)) {
            self.advance()?;
        }
        Ok(())
    }

    // =====================================================================
    // Symbol table and emission helpers
    // =====================================================================

    pub(crate) fn look_up(&mut self, name: &str, decl: bool, ssn: u32) -> Outcome<IdentId> {
        self.table
            .look_up(name, decl, ssn, self.array_bound, &mut self.diag)
    }

    #[inline]
    pub(crate) fn flags(&self, id: IdentId) -> IdentFlags {
        self.table.ident(id).flags
    }

    #[inline]
    pub(crate) fn cur_level(&self) -> i32 {
        self.table.current_level()
    }

    /// `name_n` - the emitted name of an identifier, suffixed with
    /// the sequential number of its block.
    pub(crate) fn name_seq(&self, id: IdentId) -> String {
        let i = self.table.ident(id);
        format!("{}_{}", i.name, self.table.block(i.block).seqn)
    }

    /// `dsa_k->name_n` - access to an identifier through the display.
    pub(crate) fn dsa_ref(&self, id: IdentId) -> String {
        format!("dsa_{}->{}", self.table.dsa_level(id), self.name_seq(id))
    }

    /// Fresh output fragment, inert on the first pass.
    #[inline]
    pub(crate) fn new_code(&self) -> Code {
        Code::new(self.second())
    }

    /// Code remembering the source line in the current DSA.
    pub(crate) fn emit_ssn(&self, ssn: u32) -> Code {
        let mut code = self.new_code();
        code.append(format!("      dsa_{}->line = {};\n", self.cur_level(), ssn));
        code
    }

    /// Emits DSA pointer initializations for a routine entered
    /// through `global_dsa` (thunks, switches, statements following
    /// `do`).
    pub(crate) fn emit_dsa_pointers(&mut self) {
        let mut level = self.cur_level();
        let mut b = self.table.current();
        while let Some(bid) = b {
            if let Some(proc) = self.table.block(bid).proc {
                let pname = self.table.ident(proc).name.clone();
                let pseq = self.table.block(self.table.ident(proc).block).seqn;
                self.emit.append(format!(
                    "      register struct dsa_{}_{} *dsa_{} = (void *)global_dsa->vector[{}];\n",
                    pname, pseq, level, level
                ));
                level -= 1;
            }
            b = self.table.block(bid).surr;
        }
    }

    // =====================================================================
    // Blocks
    // =====================================================================

    /// Translates an entry to a block: creates it (pass 1) or walks
    /// to it (pass 2), saving the stack top and emitting the label
    /// dispatch for non-local go to when the block owns referenced
    /// labels.
    pub(crate) fn enter_block(&mut self, proc: Option<IdentId>, ssn: u32) -> Code {
        let b = self.table.enter_block(proc, ssn);
        let mut code = self.new_code();
        if self.second() {
            let lvl = self.cur_level();
            let blvl = self.table.block_level(b);
            code.append(format!(
                "      /* start of {} block {} (level {}) at line {} */\n",
                if proc.is_some() { "procedure" } else { "local" },
                self.table.block(b).seqn,
                blvl,
                self.table.block(b).ssn
            ));
            code.append(format!(
                "      dsa_{}->old_top_{} = stack_top;\n",
                lvl, blvl
            ));
            if self.table.has_labels(b) {
                code.append("      /* jmp_buf must be of array type (ISO) */\n");
                code.append(format!(
                    "      switch (setjmp(&dsa_{}->jump_{}[0]))\n",
                    lvl, blvl
                ));
                code.append("      {  case 0: break;\n");
                let seqn = self.table.block(b).seqn;
                for id in self.table.block(b).idents.clone() {
                    let i = self.table.ident(id);
                    if !(i.flags == IdentFlags::LABEL && i.ssn_used != 0) {
                        continue;
                    }
                    // local labels are numbered by the DSA emitter
                    assert!(i.dim > 0);
                    code.append(format!(
                        "         case {}: pop_stack(dsa_{}->new_top_{}); active_dsa = (struct \
                         dsa *)dsa_{}; goto {}_{};\n",
                        i.dim, lvl, blvl, lvl, i.name, seqn
                    ));
                }
                code.append("         default: fault(\"internal error on global go to\");\n");
                code.append("      }\n");
            }
        }
        code
    }

    /// Translates the normal exit from the current block, restoring
    /// the stack top. Pass-1 bookkeeping (migration of undeclared
    /// identifiers) happens in the symbol table.
    pub(crate) fn leave_block(&mut self) -> Code {
        let mut code = self.new_code();
        if self.second() {
            let b = self.table.cur();
            code.append(format!(
                "      pop_stack(dsa_{}->old_top_{});\n",
                self.cur_level(),
                self.table.block_level(b)
            ));
            code.append(format!("      /* end of block {} */\n", self.table.block(b).seqn));
        }
        self.table.leave_block();
        code
    }

    // =====================================================================
    // Module level
    // =====================================================================

    /// Parses the whole module: at most one main program (a labelled
    /// or unlabelled block or compound statement) plus declarations
    /// of precompiled procedures. Returns whether a main program was
    /// seen.
    pub(crate) fn entire_module(&mut self) -> Outcome<bool> {
        let mut is_main = false;
        // the environmental dummy block encloses the whole module
        let _ = self.enter_block(None, 0);
        self.toks = TokenWindow::new(self.src);
        self.advance()?;
        if self.t_delim(Delim::Eof) {
            self.error("null program not allowed")?;
        } else {
            loop {
                if self.t_delim(Delim::Eof) {
                    break;
                }
                if self.t_is_ident() {
                    self.peek()?;
                }
                let mut flags = IdentFlags::empty();
                if self.t_delim(Delim::Begin)
                    || (self.t_is_ident() && self.ahead_is_delim(Delim::Colon))
                {
                    if is_main {
                        self.error("only one program allowed")?;
                    }
                    is_main = true;
                    flags = IdentFlags::PROC;
                } else {
                    if self.t_delim(Delim::Real) {
                        flags = IdentFlags::REAL;
                        self.advance()?;
                    } else if self.t_delim(Delim::Integer) {
                        flags = IdentFlags::INT;
                        self.advance()?;
                    } else if self.t_delim(Delim::Boolean) {
                        flags = IdentFlags::BOOL;
                        self.advance()?;
                    }
                    if self.t_delim(Delim::Procedure) {
                        flags |= IdentFlags::PROC;
                        self.advance()?;
                    }
                }
                if !flags.contains(IdentFlags::PROC) {
                    self.error("invalid start of program or precompiled procedure")?;
                    self.skip_to_semicolon()?;
                    if self.t_delim(Delim::Semicolon) {
                        self.advance()?;
                    }
                    continue;
                }
                self.procedure_declaration(flags)?;
                // a procedure declaration is followed by a semicolon;
                // after the main program it is optional
                if self.t_delim(Delim::Semicolon) {
                    self.advance()?;
                } else if !self.t_delim(Delim::Eof) {
                    self.error("equal number of 'begin' and 'end' brackets found")?;
                    self.skip_to_semicolon()?;
                    if self.t_delim(Delim::Semicolon) {
                        self.advance()?;
                    }
                    continue;
                }
            }
        }
        if self.first() {
            resolve(&mut self.table, &mut self.diag)?;
        }
        self.table.leave_block();
        assert!(self.table.current().is_none());
        Ok(is_main)
    }

    /// Emits the startup code calling the main program.
    pub fn emit_startup_code(&mut self) {
        self.emit.append("int main(void)\n");
        self.emit.append("{     /* Algol program startup code */\n");
        self.emit.append("      main_program_0();\n");
        self.emit.append("      return 0;\n");
        self.emit.append("}\n\n");
    }
}

pub(crate) use a60c_gen::ValType;

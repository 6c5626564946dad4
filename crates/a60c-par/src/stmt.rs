//! Statement parsing and emission.
//!
//! Assignment chains, go to (with a direct `goto` fast path for
//! labels of the current block), conditional statements compiled to
//! forward skips over `_gamma_k`/`_omega_k` labels, for statements
//! whose controlled statement is always extruded into a `_sigma_k`
//! routine, procedure statements including the `inline` and `print`
//! pseudo-procedures, and blocks.

use a60c_lex::Delim;
use a60c_sym::{IdentFlags, IdentId};
use a60c_util::{Fatal, Outcome};

use a60c_gen::Code;

use crate::{Translator, ValType};

const R: IdentFlags = IdentFlags::REAL;
const I: IdentFlags = IdentFlags::INT;
const B: IdentFlags = IdentFlags::BOOL;
const BV: IdentFlags = IdentFlags::BYVAL;
const BN: IdentFlags = IdentFlags::BYNAME;
const OW: IdentFlags = IdentFlags::OWN;
const P: IdentFlags = IdentFlags::PROC;

impl<'a> Translator<'a> {
    /// Parses an assignment statement `V := V := ... := E`.
    ///
    /// `nested` is set when the routine was entered after a `:=`
    /// delimiter; type conversion between real and integer applies
    /// only to the final expression, never across the left part list.
    pub(crate) fn assignment_statement(&mut self, nested: bool) -> Outcome<Code> {
        let mut x;
        if self.t_is_ident() {
            self.peek()?;
        }
        if self.t_is_ident() && self.ahead_is_delim(Delim::Assign) {
            // the context has the form `id := ...'
            let name = self.t_image();
            let id = self.look_up(&name, false, self.t_line())?;
            if self.first() {
                self.advance()?;
                self.advance()?;
                x = self.assignment_statement(true)?;
            } else {
                let f = self.flags(id);
                // the destination must be a simple variable, a simple
                // formal parameter, or a type procedure identifier
                if f.contains(IdentFlags::LABEL) {
                    self.error(format!(
                        "invalid use of label `{}' in left part of assignment statement",
                        name
                    ))?;
                } else if f.contains(IdentFlags::ARRAY) {
                    self.error(format!(
                        "invalid use of array identifier `{}' in left part of assignment \
                         statement",
                        name
                    ))?;
                } else if f.contains(IdentFlags::SWITCH) {
                    self.error(format!(
                        "invalid use of switch identifier `{}' in left part of assignment \
                         statement",
                        name
                    ))?;
                } else if f.contains(IdentFlags::STRING) {
                    self.error(format!(
                        "invalid use of formal string `{}' in left part of assignment statement",
                        name
                    ))?;
                } else if f.contains(P) {
                    // assignment to a procedure identifier is legal
                    // only inside that procedure's own body
                    let mut b = self.table.current();
                    let mut inside = false;
                    while let Some(bid) = b {
                        if self.table.block(bid).proc == Some(id) {
                            inside = true;
                            break;
                        }
                        b = self.table.block(bid).surr;
                    }
                    if !inside {
                        self.error(format!(
                            "invalid assignment to procedure identifier `{}' outside procedure \
                             declaration body",
                            name
                        ))?;
                    }
                    if f.type_part().is_empty() {
                        self.error(format!(
                            "invalid use of typeless procedure identifier `{}' in left part of \
                             assignment statement",
                            name
                        ))?;
                    }
                }
                self.advance()?; // id
                self.advance()?; // :=
                x = self.assignment_statement(true)?;
                // type conversion is allowed only for the final
                // expression
                if !x.lval {
                    if f.contains(R) && x.ty == ValType::Int {
                        self.to_real(&mut x);
                    }
                    if f.contains(I) && x.ty == ValType::Real {
                        self.to_int(&mut x);
                    }
                    if ValType::from_flags(f.type_part()) != x.ty {
                        self.error(format!(
                            "type of identifier `{}' in left part of assignment statement \
                             incompatible with type of assigned expression",
                            name
                        ))?;
                    }
                } else if ValType::from_flags(f.type_part()) != x.ty {
                    self.error("different types in left part list of assignment statement")?;
                }
                // select the output form for the destination
                if f == R
                    || f == R | OW
                    || f == R | BV
                    || f == I
                    || f == I | OW
                    || f == I | BV
                    || f == B
                    || f == B | OW
                    || f == B | BV
                {
                    x.lval = true; // mark assignment statement
                    x.ty = ValType::from_flags(f.type_part());
                    if f.contains(OW) {
                        x.prepend(format!("{} = ", self.name_seq(id)));
                    } else {
                        x.prepend(format!("{} = ", self.dsa_ref(id)));
                    }
                } else if f == R | BN || f == I | BN || f == B | BN {
                    let set = if f.contains(R) {
                        "set_real"
                    } else if f.contains(I) {
                        "set_int"
                    } else {
                        "set_bool"
                    };
                    let mut code = self.call_by_name(id);
                    code.prepend(format!("{}(", set));
                    code.append(", ");
                    code.catenate(x);
                    code.append(")");
                    x = code;
                    x.lval = true;
                    x.ty = ValType::from_flags(f.type_part());
                } else if f == R | P || f == I | P || f == B | P {
                    x.lval = true;
                    x.ty = ValType::from_flags(f.type_part());
                    let member = match x.ty {
                        ValType::Real => "real_val",
                        ValType::Int => "int_val",
                        _ => "bool_val",
                    };
                    x.prepend(format!(
                        "dsa_{}->retval.u.{} = ",
                        self.table.dsa_level(id) + 1,
                        member
                    ));
                }
                // other destination kinds were already diagnosed
            }
        } else {
            // the context begins a left part that can only be a
            // subscripted variable, or is the final expression
            x = self.expression()?;
            if self.t_delim(Delim::Assign) {
                if self.second() && !x.lval {
                    self.error(
                        "invalid use of delimiter `:=' after expression in assignment statement",
                    )?;
                }
                self.advance()?; // :=
                let mut y = self.assignment_statement(true)?;
                if self.second() {
                    if !y.lval {
                        if x.ty == ValType::Real && y.ty == ValType::Int {
                            self.to_real(&mut y);
                        }
                        if x.ty == ValType::Int && y.ty == ValType::Real {
                            self.to_int(&mut y);
                        }
                        if x.ty != y.ty {
                            self.error(
                                "type of destination in left part of assignment statement \
                                 incompatible with type of assigned expression",
                            )?;
                        }
                    } else if x.ty != y.ty {
                        self.error("different types in left part list of assignment statement")?;
                    }
                    x.lval = true; // mark assignment statement
                    x.append(" = ");
                    x.catenate(y);
                }
            } else if self.second() {
                // the final expression of the chain
                if !nested {
                    self.error("invalid use of expression")?;
                } else {
                    if !matches!(x.ty, ValType::Real | ValType::Int | ValType::Bool) {
                        self.error("invalid type of assigned expression in assignment statement")?;
                        x.ty = ValType::Real;
                    }
                    x.lval = false;
                }
            }
        }
        if !nested {
            x.prepend("      ");
            x.append(";\n");
        }
        Ok(x)
    }

    /// Parses `go to <designational expression>`. A label of the
    /// current block jumps directly; everything else transfers
    /// through the runtime.
    pub(crate) fn go_to_statement(&mut self) -> Outcome<Code> {
        assert!(self.t_delim(Delim::Goto));
        self.advance()?;
        if self.second() && self.t_is_ident() {
            self.peek()?;
            if self.ahead_is_delim(Delim::Semicolon)
                || self.ahead_is_delim(Delim::Else)
                || self.ahead_is_delim(Delim::End)
            {
                let name = self.t_image();
                let id = self.look_up(&name, false, self.t_line())?;
                if !self.flags(id).contains(IdentFlags::LABEL) {
                    self.error(format!(
                        "invalid use identifier `{}' as a label in go to statement",
                        name
                    ))?;
                }
                if self.flags(id) == IdentFlags::LABEL
                    && self.table.ident(id).block == self.table.cur()
                {
                    // direct go to within the same block
                    let mut code = self.new_code();
                    code.append(format!("      goto {};\n", self.name_seq(id)));
                    self.advance()?;
                    return Ok(code);
                }
            }
        }
        let mut code = self.expression()?;
        if self.second() {
            if code.ty != ValType::Label {
                self.error("expression following `go to' is not of label type")?;
            }
            code.prepend("      go_to(");
            code.append(");\n");
        }
        Ok(code)
    }

    pub(crate) fn dummy_statement(&mut self) -> Outcome<Code> {
        let mut code = self.new_code();
        code.append("      /* <dummy statement> */;\n");
        Ok(code)
    }

    /// Parses the optional list of labels preceding a statement,
    /// declaring each in the current block, and inserts the source
    /// line bookkeeping for the following statement.
    pub(crate) fn label_list(&mut self) -> Outcome<Code> {
        let mut code = self.new_code();
        if self.t_delim(Delim::Else) || self.t_delim(Delim::End) || self.t_delim(Delim::Semicolon)
        {
            self.warning("unlabelled dummy statement");
        }
        loop {
            if self.t_is_ident() || self.t_is_int() {
                self.peek()?;
            }
            if self.t_is_ident() && self.ahead_is_delim(Delim::Colon) {
                // implicit declaration in the current block
                let name = self.t_image();
                let label = self.look_up(&name, true, self.t_line())?;
                self.table.ident_mut(label).flags = IdentFlags::LABEL;
                code.append(format!("{}:\n", self.name_seq(label)));
                self.advance()?;
                self.advance()?;
            } else if self.t_is_int() && self.ahead_is_delim(Delim::Colon) {
                // valid in the Revised Report, invalid in the
                // Modified Report
                let image = self.t_image();
                self.error(format!(
                    "invalid use unsigned integer `{}' as a label",
                    image
                ))?;
                self.advance()?;
                self.advance()?;
            } else {
                break;
            }
        }
        let e = self.emit_ssn(self.t_line());
        code.catenate(e);
        Ok(code)
    }

    /// Parses `if E then S` / `if E then S1 else S2`. The statement
    /// between `then` and `else` must not itself be a conditional or
    /// for statement.
    pub(crate) fn conditional_statement(&mut self) -> Outcome<Code> {
        assert!(self.t_delim(Delim::If));
        self.advance()?;
        let mut code = self.expression()?;
        if !self.t_delim(Delim::Then) {
            self.error("missing `then' delimiter")?;
        }
        if self.second() && code.ty != ValType::Bool {
            self.error("expression following `if' is not of Boolean type")?;
        }
        if self.t_delim(Delim::Then) {
            self.advance()?;
        }
        let mut then_part = self.label_list()?;
        let no_else = self.t_delim(Delim::If) || self.t_delim(Delim::For);
        let s = self.statement()?;
        then_part.catenate(s);
        if !self.t_delim(Delim::Else) {
            if self.second() {
                self.label_count += 1;
                let n = self.label_count;
                code.prepend("      if (!(");
                code.append(format!(")) goto _omega_{};\n", n));
                code.catenate(then_part);
                code.append(format!("_omega_{}:\n", n));
            }
        } else {
            if no_else {
                self.error("invalid use of delimiter `else' after if or for statement")?;
            }
            self.advance()?; // else
            let mut else_part = self.label_list()?;
            let s = self.statement()?;
            else_part.catenate(s);
            if self.second() {
                self.label_count += 1;
                let n = self.label_count;
                code.prepend("      if (!(");
                code.append(format!(")) goto _gamma_{};\n", n));
                code.catenate(then_part);
                code.append(format!("      goto _omega_{};\n_gamma_{}:\n", n, n));
                code.catenate(else_part);
                code.append(format!("_omega_{}:\n", n));
            }
        }
        Ok(code)
    }

    /// Code reading the controlled variable, as if it were used in an
    /// expression.
    pub(crate) fn get_variable(&mut self, id: IdentId) -> Code {
        let mut expr = self.new_code();
        if self.second() {
            let f = self.flags(id);
            if f == R || f == R | OW || f == R | BV || f == I || f == I | OW || f == I | BV {
                expr.lval = false;
                expr.ty = ValType::from_flags(f.type_part());
                if f.contains(OW) {
                    expr.append(self.name_seq(id));
                } else {
                    expr.append(self.dsa_ref(id));
                }
            } else if f == R | BN || f == I | BN {
                expr.lval = false;
                expr.ty = ValType::from_flags(f.type_part());
                expr.append(if f.contains(R) { "get_real(" } else { "get_int(" });
                let cbn = self.call_by_name(id);
                expr.catenate(cbn);
                expr.append(")");
            } else {
                // invalid controlled variable, already diagnosed
                expr.append("???");
            }
        }
        expr
    }

    /// Code assigning `expr` to the controlled variable, as if it
    /// were the left part of an assignment statement.
    pub(crate) fn set_variable(&mut self, id: IdentId, mut expr: Code) -> Code {
        if self.second() {
            let f = self.flags(id);
            if f.contains(R) && expr.ty == ValType::Int {
                self.to_real(&mut expr);
            }
            if f.contains(I) && expr.ty == ValType::Real {
                self.to_int(&mut expr);
            }
            if f == R || f == R | OW || f == R | BV || f == I || f == I | OW || f == I | BV {
                expr.ty = ValType::from_flags(f.type_part());
                if f.contains(OW) {
                    expr.prepend(format!("{} = ", self.name_seq(id)));
                } else {
                    expr.prepend(format!("{} = ", self.dsa_ref(id)));
                }
            } else if f == R | BN || f == I | BN {
                let mut code = self.call_by_name(id);
                code.prepend(if f.contains(R) { "set_real(" } else { "set_int(" });
                code.append(", ");
                code.catenate(expr);
                code.append(")");
                expr = code;
                expr.lval = true;
                expr.ty = ValType::from_flags(f.type_part());
            } else {
                expr.append("???");
            }
            expr.prepend("      ");
            expr.append(";\n");
        }
        expr
    }

    /// Parses `for V := <for list> do S`. The controlled statement is
    /// always translated into a separate `_sigma_k` routine so that
    /// multi-element for lists can invoke it repeatedly.
    pub(crate) fn for_statement(&mut self) -> Outcome<Code> {
        let mut code = self.new_code();
        let count = if self.first() {
            0
        } else {
            self.for_count += 1;
            self.for_count
        };
        assert!(self.t_delim(Delim::For));
        self.advance()?;
        // the controlled variable
        let id = if self.t_is_ident() {
            let name = self.t_image();
            let id = self.look_up(&name, false, self.t_line())?;
            self.advance()?;
            id
        } else {
            let dummy = format!("i_{}", self.t_line());
            self.error(format!(
                "missing controlled variable identifier after `for'; dummy identifier `{}' used",
                dummy
            ))?;
            let ssn = self.t_line();
            let id = self.look_up(&dummy, true, ssn)?;
            let i = self.table.ident_mut(id);
            i.ssn_decl = ssn;
            i.ssn_used = ssn;
            i.flags = R;
            id
        };
        if self.t_delim(Delim::BegSub) {
            self.error("subscripted controlled variable not allowed")?;
        }
        if self.t_delim(Delim::Assign) {
            self.advance()?;
        } else {
            self.error("missing ':=' after controlled variable identifier")?;
        }
        if self.second() {
            let f = self.flags(id);
            if f.intersects(
                IdentFlags::LABEL
                    | IdentFlags::ARRAY
                    | IdentFlags::SWITCH
                    | P
                    | IdentFlags::STRING,
            ) {
                self.error(format!(
                    "invalid use of identifier `{}' as controlled variable",
                    self.table.ident(id).name
                ))?;
            } else if !f.intersects(R | I) {
                self.error(format!(
                    "invalid type of controlled variable `{}'",
                    self.table.ident(id).name
                ))?;
            }
        }
        // translate the for list
        loop {
            let e = self.emit_ssn(self.t_line());
            code.catenate(e);
            // V := expression
            {
                let mut expr = self.expression()?;
                if self.second() {
                    if !expr.ty.is_arith() {
                        self.error("invalid type of expression assigned to controlled variable")?;
                        expr.ty = ValType::Real;
                    }
                    // a while element repeats the assignment, so the
                    // loop label comes first
                    if self.t_delim(Delim::While) {
                        self.label_count += 1;
                        code.append(format!("_gamma_{}:\n", self.label_count));
                        let e = self.emit_ssn(self.t_line());
                        code.catenate(e);
                    }
                    let sv = self.set_variable(id, expr);
                    code.catenate(sv);
                }
            }
            if self.t_delim(Delim::Comma) || self.t_delim(Delim::Do) {
                // arithmetic expression element: one execution
                code.append(format!(
                    "      global_dsa = (void *)dsa_{}, _sigma_{}();\n",
                    self.cur_level(),
                    count
                ));
            } else if self.t_delim(Delim::Step) {
                self.step_until_element(&mut code, id, count)?;
            } else if self.t_delim(Delim::While) {
                // E while F
                self.advance()?;
                let expr = self.expression()?;
                if self.second() {
                    let mut expr = expr;
                    if expr.ty != ValType::Bool {
                        self.error("expression following `while' is not of Boolean type")?;
                        expr.ty = ValType::Bool;
                    }
                    // the loop label was generated before V := E
                    code.append("      if (!(");
                    code.catenate(expr);
                    code.append(format!(")) goto _omega_{};\n", self.label_count));
                }
                code.append(format!(
                    "      global_dsa = (void *)dsa_{}, _sigma_{}();\n",
                    self.cur_level(),
                    count
                ));
                code.append(format!("      goto _gamma_{};\n", self.label_count));
                code.append(format!("_omega_{}:\n", self.label_count));
            }
            if self.t_delim(Delim::Comma) {
                self.advance()?;
                continue;
            }
            break;
        }
        if !self.t_delim(Delim::Do) {
            self.error("missing `do' delimiter after for list")?;
        }
        // the statement following `do' becomes a separate routine
        {
            let ssn = self.t_line();
            let mut stmt = self.enter_block(None, ssn);
            stmt.append(format!(
                "      dsa_{}->new_top_{} = stack_top;\n",
                self.cur_level(),
                self.table.block_level(self.table.cur())
            ));
            if self.t_delim(Delim::Do) {
                self.advance()?;
            }
            let ll = self.label_list()?;
            stmt.catenate(ll);
            let s = self.statement()?;
            stmt.catenate(s);
            let lv = self.leave_block();
            stmt.catenate(lv);
            if self.second() {
                self.emit
                    .append(format!("static void _sigma_{}(void)\n", count));
                self.emit.append(format!(
                    "{{     /* statement following 'do' at line {} */\n",
                    ssn
                ));
                self.emit_dsa_pointers();
                self.emit.catenate(stmt);
                self.emit.append("      return;\n");
                self.emit.append("}\n");
                self.emit.append("\n");
            }
        }
        Ok(code)
    }

    /// One `A step B until C` element of a for list.
    fn step_until_element(&mut self, code: &mut Code, id: IdentId, count: u32) -> Outcome<()> {
        // the auxiliary variable teta holds the step value; its type
        // follows B, unknown on the first pass, so one of each
        // numeric type is declared in the current block
        if self.first() {
            let ssn = self.t_line();
            for (name, flags) in [("teta_r", R), ("teta_i", I)] {
                let t = self.look_up(name, false, ssn)?;
                if self.table.ident(t).ssn_decl == 0 {
                    self.table.ident_mut(t).ssn_decl = ssn;
                }
                self.table.ident_mut(t).flags = flags;
            }
        }
        self.advance()?; // step
        let expr = self.expression()?;
        let mut teta = None;
        if self.second() {
            let t = match expr.ty {
                ValType::Real => self.look_up("teta_r", false, 0)?,
                ValType::Int => self.look_up("teta_i", false, 0)?,
                _ => {
                    self.error("expression following `step' is not of arithmetic type")?;
                    self.look_up("teta_r", false, 0)?
                }
            };
            assert_eq!(self.table.ident(t).block, self.table.cur());
            teta = Some(t);
            // teta := B
            code.append(format!("      {} = ", self.dsa_ref(t)));
            code.catenate(expr);
            code.append(";\n");
            self.label_count += 1;
            code.append(format!("_gamma_{}:\n", self.label_count));
            let e = self.emit_ssn(self.t_line());
            code.catenate(e);
        }
        if self.t_delim(Delim::Until) {
            self.advance()?;
        } else {
            self.error("missing `until' delimiter")?;
        }
        let mut until = self.expression()?;
        if self.second() {
            let f = self.flags(id);
            if f.contains(R) && until.ty == ValType::Int {
                self.to_real(&mut until);
            }
            if f.contains(I) && until.ty == ValType::Real {
                self.to_int(&mut until);
            }
            if !until.ty.is_arith() {
                self.error("expression following `until' is not of arithmetic type")?;
                until.ty = ValType::Real;
            }
            // break when (V - C) * sign(teta) > 0; the conversions
            // here need care
            let t = teta.expect("teta selected above");
            let tref = self.dsa_ref(t);
            code.append("      if ((");
            let gv = self.get_variable(id);
            code.catenate(gv);
            code.append(" - (");
            code.catenate(until);
            if f.contains(R) {
                code.append(")) * (double)(");
            } else {
                code.append(")) * (");
            }
            if self.flags(t).contains(R) {
                code.append(format!(
                    "{} < 0.0 ? -1 : {} > 0.0 ? +1 : 0",
                    tref, tref
                ));
            } else {
                code.append(format!("{} < 0 ? -1 : {} > 0 ? +1 : 0", tref, tref));
            }
            if f.contains(R) {
                code.append(") > 0.0) ");
            } else {
                code.append(") > 0) ");
            }
            code.append(format!("goto _omega_{};\n", self.label_count));
        }
        code.append(format!(
            "      global_dsa = (void *)dsa_{}, _sigma_{}();\n",
            self.cur_level(),
            count
        ));
        // V := V + teta
        if self.second() {
            let t = teta.expect("teta selected above");
            let mut expr = self.new_code();
            expr.lval = false;
            expr.ty = ValType::from_flags(self.flags(t).type_part());
            expr.append(self.dsa_ref(t));
            let f = self.flags(id);
            if f.contains(R) && self.flags(t).contains(I) {
                self.to_real(&mut expr);
            }
            if f.contains(I) && self.flags(t).contains(R) {
                self.to_int(&mut expr);
            }
            expr.append(" + ");
            let gv = self.get_variable(id);
            expr.catenate(gv);
            let sv = self.set_variable(id, expr);
            code.catenate(sv);
        }
        code.append(format!("      goto _gamma_{};\n", self.label_count));
        code.append(format!(
            "_omega_{}: /* element exhausted */\n",
            self.label_count
        ));
        Ok(())
    }

    /// Parses a procedure statement. The pseudo-procedures `inline`
    /// and `print` expand specially; everything else is handled by
    /// the function designator routine.
    pub(crate) fn procedure_statement(&mut self) -> Outcome<Code> {
        assert!(self.t_is_ident());
        let name = self.t_image();
        let proc = self.look_up(&name, false, self.t_line())?;
        let bltin = self.flags(proc).contains(IdentFlags::BLTIN);
        if self.second() && name == "inline" && bltin {
            return self.inline_statement();
        }
        if self.second() && name == "print" && bltin {
            return self.print_statement();
        }
        let mut code = self.function_designator(true)?;
        code.prepend("      ");
        code.append(";\n");
        Ok(code)
    }

    /// `inline("...")` inserts its string verbatim into the emitted
    /// C. Misuse terminates the translation.
    fn inline_statement(&mut self) -> Outcome<Code> {
        self.advance()?; // id
        if !self.t_delim(Delim::Left) {
            return self.inline_misuse();
        }
        self.advance()?; // (
        if !self.t_is_string() {
            return self.inline_misuse();
        }
        let mut code = self.new_code();
        code.append("      /* inline code */\n      ");
        // strip the enclosing quotes and the escape backslashes
        let image = self.t_image();
        let mut text = String::new();
        let mut it = image.chars();
        it.next(); // opening quote
        while let Some(c) = it.next() {
            if c == '"' {
                break;
            }
            if c == '\\' {
                if let Some(e) = it.next() {
                    text.push(e);
                }
            } else {
                text.push(c);
            }
        }
        code.append(format!("{}\n", text));
        self.advance()?; // string
        if !self.t_delim(Delim::Right) || self.ext_comma()? {
            return self.inline_misuse();
        }
        self.advance()?; // )
        Ok(code)
    }

    fn inline_misuse(&mut self) -> Outcome<Code> {
        self.error("invalid use of pseudo procedure `inline'; translation terminated")?;
        Err(Fatal)
    }

    /// `print(a, b, ...)` expands to a variadic runtime call carrying
    /// the parameter count and, per parameter, its kind word, its
    /// source name (when it is a lone identifier), and its value or
    /// descriptor.
    fn print_statement(&mut self) -> Outcome<Code> {
        self.advance()?; // id
        if !self.t_delim(Delim::Left) {
            self.error("invalid use of pseudo procedure `print'")?;
            return Ok(self.new_code());
        }
        self.advance()?; // (
        let mut args = self.new_code();
        let mut count: u32 = 0;
        loop {
            if self.t_is_ident() {
                self.peek()?;
            }
            let id = if self.t_is_ident()
                && (self.ahead_is_delim(Delim::Comma) || self.ahead_is_delim(Delim::Right))
            {
                let name = self.t_image();
                Some(self.look_up(&name, false, self.t_line())?)
            } else {
                None
            };
            let is_array = id.map_or(false, |i| self.flags(i).contains(IdentFlags::ARRAY));
            let is_formal_string = id.map_or(false, |i| self.flags(i).contains(IdentFlags::STRING));
            let expr;
            if is_array {
                expr = self.actual_parameter(None)?;
                args.append(format!(", 0x{:04X}, ", IdentFlags::ARRAY.bits()));
            } else if is_formal_string {
                expr = self.actual_parameter(None)?;
                args.append(format!(", 0x{:04X}, ", IdentFlags::STRING.bits()));
            } else if self.t_is_string() {
                let mut s = self.new_code();
                s.append("make_arg(");
                s.append(self.t_image());
                s.append(", NULL)");
                expr = s;
                args.append(format!(", 0x{:04X}, ", IdentFlags::STRING.bits()));
                self.advance()?;
            } else {
                let e = self.expression()?;
                args.append(format!(", 0x{:04X}, ", e.ty.flag_bits()));
                expr = e;
            }
            if let Some(i) = id {
                args.append(format!("\"{}\", ", self.table.ident(i).name));
            } else {
                args.append("NULL, ");
            }
            args.catenate(expr);
            count += 1;
            if !self.ext_comma()? {
                break;
            }
        }
        if self.t_delim(Delim::Right) {
            self.advance()?;
        } else {
            self.error("missing right parenthesis after actual parameter list")?;
        }
        let mut code = self.new_code();
        code.append(format!("      print({:3}", count));
        code.catenate(args);
        code.append(");\n");
        assert!(count <= 255);
        Ok(code)
    }

    /// Parses one unlabeled statement, dispatching on the current
    /// token (and one token of lookahead for identifiers).
    pub(crate) fn statement(&mut self) -> Outcome<Code> {
        if self.t_is_ident() {
            self.peek()?;
        }
        let code = if self.t_delim(Delim::Begin) {
            self.block_or_compound_statement()?
        } else if self.t_is_ident()
            && (self.ahead_is_delim(Delim::Assign) || self.ahead_is_delim(Delim::BegSub))
        {
            self.assignment_statement(false)?
        } else if self.t_delim(Delim::Goto) {
            self.go_to_statement()?
        } else if self.t_delim(Delim::Else)
            || self.t_delim(Delim::End)
            || self.t_delim(Delim::Semicolon)
        {
            self.dummy_statement()?
        } else if self.t_delim(Delim::If) {
            self.conditional_statement()?
        } else if self.t_delim(Delim::For) {
            self.for_statement()?
        } else if self.t_is_ident()
            && (self.ahead_is_delim(Delim::Left)
                || self.ahead_is_delim(Delim::Else)
                || self.ahead_is_delim(Delim::End)
                || self.ahead_is_delim(Delim::Semicolon))
        {
            self.procedure_statement()?
        } else if self.t_delim(Delim::Eof) {
            self.error("unexpected eof")?;
            self.new_code()
        } else {
            // erroneous context
            let image = self.t_image();
            if self.t_is_ident() {
                self.error(format!("invalid use of identifier `{}'", image))?;
            } else if matches!(
                self.t_kind(),
                a60c_lex::TokenKind::Int(_)
                    | a60c_lex::TokenKind::Real(_)
                    | a60c_lex::TokenKind::False
                    | a60c_lex::TokenKind::True
            ) {
                self.error(format!("invalid use of constant `{}'", image))?;
            } else if self.t_is_string() {
                self.error("invalid use of string")?;
            } else if self.is_declaration() {
                self.error(format!("declarator `{}' in invalid position", image))?;
            } else {
                self.error(format!("invalid use of delimiter `{}'", image))?;
            }
            self.skip_to_statement_end()?;
            self.new_code()
        };
        // the statement must end at a synchronizing delimiter
        if !(self.t_delim(Delim::Eof)
            || self.t_delim(Delim::Semicolon)
            || self.t_delim(Delim::Else)
            || self.t_delim(Delim::End))
        {
            self.error("missing semicolon, `else', or `end' after statement")?;
            self.skip_to_statement_end()?;
        }
        // the delimiter itself is processed by the caller
        Ok(code)
    }

    /// Parses `begin ... end`: a block when declarations follow the
    /// opening bracket, a compound statement otherwise.
    pub(crate) fn block_or_compound_statement(&mut self) -> Outcome<Code> {
        assert!(self.t_delim(Delim::Begin));
        self.advance()?;
        let is_block = self.is_declaration();
        let mut code;
        if is_block {
            code = self.enter_block(None, self.t_line());
            loop {
                if !self.is_declaration() {
                    break;
                }
                let d = self.declaration()?;
                code.catenate(d);
                // the semicolon after a declaration was checked by
                // the declaration routine
                assert!(self.t_delim(Delim::Semicolon) || self.t_delim(Delim::Eof));
                if self.t_delim(Delim::Semicolon) {
                    self.advance()?;
                }
            }
            // array declarations move the stack top; record it for
            // non-local go to into this block
            code.append(format!(
                "      dsa_{}->new_top_{} = stack_top;\n",
                self.cur_level(),
                self.table.block_level(self.table.cur())
            ));
        } else {
            code = self.new_code();
        }
        loop {
            let ll = self.label_list()?;
            code.catenate(ll);
            let s = self.statement()?;
            code.catenate(s);
            if self.t_delim(Delim::Eof) {
                self.error("missing `end' bracket")?;
                break;
            } else if self.t_delim(Delim::Else) {
                self.error("invalid use of delimiter `else' outside if statement")?;
                self.advance()?; // ignore it
            } else if self.t_delim(Delim::End) {
                break;
            } else if self.t_delim(Delim::Semicolon) {
                self.advance()?; // the next statement follows
            } else {
                unreachable!("statement ends at a synchronizing delimiter");
            }
        }
        if is_block {
            let lv = self.leave_block();
            code.catenate(lv);
        }
        if self.t_delim(Delim::End) {
            self.advance()?;
        }
        Ok(code)
    }
}

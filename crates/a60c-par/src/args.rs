//! Function designators, procedure calls, and actual parameters.
//!
//! Every actual parameter is passed as a uniform two-pointer
//! descriptor built by the runtime routine `make_arg`. Strings pass
//! their body, arrays their dope vector plus an element type tag,
//! switches and procedures their routine plus the caller's DSA, and
//! any other expression is extruded into a thunk: a static routine
//! evaluating the expression in the caller's environment and
//! returning a value descriptor. Formal parameters called by name
//! are passed through unchanged.

use a60c_lex::{Delim, TokenKind};
use a60c_sym::{IdentFlags, IdentId};
use a60c_util::Outcome;

use a60c_gen::Code;

use crate::{Translator, ValType};

const R: IdentFlags = IdentFlags::REAL;
const I: IdentFlags = IdentFlags::INT;
const B: IdentFlags = IdentFlags::BOOL;
const L: IdentFlags = IdentFlags::LABEL;
const BV: IdentFlags = IdentFlags::BYVAL;
const BN: IdentFlags = IdentFlags::BYNAME;

/// Which shared-constant thunk a constant actual parameter maps to.
#[derive(Clone, Copy)]
enum ConstThunk {
    Real0,
    Real1,
    Int0,
    Int1,
    False,
    True,
}

impl<'a> Translator<'a> {
    /// Context of a formal parameter for diagnostics: its name, the
    /// procedure's name, and the procedure's declaration line.
    fn formal_context(&self, arg: IdentId) -> (String, String, u32) {
        let fb = self.table.ident(arg).block;
        let proc = self.table.block(fb).proc.expect("formal in a procedure block");
        (
            self.table.ident(arg).name.clone(),
            self.table.ident(proc).name.clone(),
            self.table.ident(proc).ssn_decl,
        )
    }

    /// Actual/formal type compatibility after merging real and
    /// integer (which are mutually convertible), over the given mask.
    fn types_match(actual: IdentFlags, formal: IdentFlags, mask: IdentFlags) -> bool {
        let mut a = actual & mask;
        let mut f = formal & mask;
        if a.intersects(R | I) {
            a &= !(R | I);
            f &= !(R | I);
        }
        a == f
    }

    /// Parses an extended parameter delimiter: a comma, or the
    /// sequence `) <letter string> : (`. Returns whether a delimiter
    /// was consumed (i.e. another parameter follows).
    pub(crate) fn ext_comma(&mut self) -> Outcome<bool> {
        if self.t_delim(Delim::Comma) {
            self.advance()?;
            return Ok(true);
        }
        if self.t_delim(Delim::Right) {
            self.peek()?;
            if !self.ahead_is_ident() {
                return Ok(false);
            }
            self.advance()?; // )
            assert!(self.t_is_ident());
            // the letter string is syntactic only
            if self.t_image().bytes().any(|c| !c.is_ascii_alphabetic()) {
                self.error("invalid letter string in parameter delimiter")?;
            }
            self.advance()?; // letter string
            if self.t_delim(Delim::Colon) {
                self.advance()?;
            } else {
                self.error("missing colon in parameter delimiter")?;
            }
            if self.t_delim(Delim::Left) {
                self.advance()?;
            } else {
                self.error("missing left parenthesis in parameter delimiter")?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn const_thunk_get(&self, key: ConstThunk) -> u32 {
        match key {
            ConstThunk::Real0 => self.thunk_real0,
            ConstThunk::Real1 => self.thunk_real1,
            ConstThunk::Int0 => self.thunk_int0,
            ConstThunk::Int1 => self.thunk_int1,
            ConstThunk::False => self.thunk_false,
            ConstThunk::True => self.thunk_true,
        }
    }

    fn const_thunk_set(&mut self, key: ConstThunk, n: u32) {
        match key {
            ConstThunk::Real0 => self.thunk_real0 = n,
            ConstThunk::Real1 => self.thunk_real1 = n,
            ConstThunk::Int0 => self.thunk_int0 = n,
            ConstThunk::Int1 => self.thunk_int1 = n,
            ConstThunk::False => self.thunk_false = n,
            ConstThunk::True => self.thunk_true = n,
        }
    }

    /// Translates one actual parameter into its descriptor. When
    /// `arg` names the corresponding formal parameter (known local
    /// procedures only), the actual/formal correspondence is checked.
    pub(crate) fn actual_parameter(&mut self, arg: Option<IdentId>) -> Outcome<Code> {
        let mut code = self.new_code();
        // a quoted string passes its body directly
        if self.t_is_string() {
            let image = self.t_image();
            let mut ok = true;
            if self.second() {
                if let Some(a) = arg {
                    if !self.flags(a).contains(IdentFlags::STRING) {
                        let (an, pn, pl) = self.formal_context(a);
                        self.error(format!(
                            "string passed as actual parameter conflicts with kind of formal \
                             parameter `{}' as specified in declaration of procedure `{}' \
                             beginning at line {}",
                            an, pn, pl
                        ))?;
                        ok = false;
                    }
                }
            }
            if ok {
                code.append("make_arg(");
                code.append(image);
                code.append(", NULL)");
            }
            self.advance()?;
            return Ok(code);
        }
        // parsing needs the lookahead hint
        self.peek()?;
        // special cases when the actual parameter is a lone identifier
        if self.t_is_ident()
            && (self.ahead_is_delim(Delim::Comma) || self.ahead_is_delim(Delim::Right))
        {
            let name = self.t_image();
            let id = self.look_up(&name, false, self.t_line())?;
            // the first pass treats any identifier here as an
            // expression
            if self.second() {
                let f = self.flags(id);
                if f == R | BN || f == I | BN || f == B | BN {
                    // a simple formal called by name is re-passed
                    // unchanged, no new thunk
                    let mut ok = true;
                    if let Some(a) = arg {
                        let af = self.flags(a);
                        let (an, pn, pl) = self.formal_context(a);
                        if af.intersects(!(R | I | B | BV | BN)) {
                            self.error(format!(
                                "formal parameter `{}' called by name and passed as actual \
                                 parameter conflicts with kind of formal parameter `{}' as \
                                 specified in declaration of procedure `{}' beginning at line {}",
                                name, an, pn, pl
                            ))?;
                            ok = false;
                        } else if !Self::types_match(f, af, R | I | B) {
                            self.error(format!(
                                "type of formal parameter `{}' called by name and passed as \
                                 actual parameter conflicts with type of formal parameter `{}' \
                                 as specified in declaration of procedure `{}' beginning at line \
                                 {}",
                                name, an, pn, pl
                            ))?;
                            ok = false;
                        }
                    }
                    if ok {
                        code.append(self.dsa_ref(id));
                    }
                    self.advance()?;
                    return Ok(code);
                }
                if f.contains(IdentFlags::ARRAY) {
                    let mut ok = true;
                    if let Some(a) = arg {
                        let af = self.flags(a);
                        let (an, pn, pl) = self.formal_context(a);
                        if !af.contains(IdentFlags::ARRAY) {
                            self.error(format!(
                                "array `{}' passed as actual parameter conflicts with kind of \
                                 formal parameter `{}' as specified in declaration of procedure \
                                 `{}' beginning at line {}",
                                name, an, pn, pl
                            ))?;
                            ok = false;
                        } else {
                            // a by-value formal array copies, so real
                            // and integer are compatible there
                            let compatible = if af.contains(BV) {
                                Self::types_match(f, af, R | I | B)
                            } else {
                                f.type_part() == af.type_part()
                            };
                            if !compatible {
                                self.error(format!(
                                    "type of array `{}' passed as actual parameter conflicts \
                                     with type of formal array `{}' as specified in declaration \
                                     of procedure `{}' beginning at line {}",
                                    name, an, pn, pl
                                ))?;
                                ok = false;
                            } else {
                                let adim = self.table.ident(id).dim;
                                let fdim = self.table.ident(a).dim;
                                if adim >= 0 && fdim >= 0 && adim != fdim {
                                    self.error(format!(
                                        "dimension of array `{}' passed as actual parameter not \
                                         equal to dimension of formal array `{}' as implied in \
                                         declaration of procedure `{}' beginning at line {}",
                                        name, an, pn, pl
                                    ))?;
                                    ok = false;
                                }
                            }
                        }
                    }
                    if ok {
                        if !f.contains(IdentFlags::OWN) {
                            code.append(format!("make_arg({}", self.dsa_ref(id)));
                        } else {
                            code.append(format!("make_arg({}", self.name_seq(id)));
                        }
                        code.append(format!(
                            ", (void *)'{}')",
                            if f.contains(R) {
                                'r'
                            } else if f.contains(I) {
                                'i'
                            } else if f.contains(B) {
                                'b'
                            } else {
                                '?'
                            }
                        ));
                    }
                    self.advance()?;
                    return Ok(code);
                }
                if f.contains(IdentFlags::SWITCH) {
                    let mut ok = true;
                    if let Some(a) = arg {
                        if !self.flags(a).contains(IdentFlags::SWITCH) {
                            let (an, pn, pl) = self.formal_context(a);
                            self.error(format!(
                                "switch `{}' passed as actual parameter conflicts with kind of \
                                 formal parameter `{}' as specified in declaration of procedure \
                                 `{}' beginning at line {}",
                                name, an, pn, pl
                            ))?;
                            ok = false;
                        }
                    }
                    if ok {
                        if !f.contains(BN) {
                            code.append(format!(
                                "make_arg((void *){}, dsa_{})",
                                self.name_seq(id),
                                self.cur_level()
                            ));
                        } else {
                            code.append(self.dsa_ref(id));
                        }
                    }
                    self.advance()?;
                    return Ok(code);
                }
                if f.contains(IdentFlags::PROC) {
                    let ok = self.check_proc_actual(id, arg, &name)?;
                    if ok {
                        if !f.contains(BN) {
                            code.append(format!(
                                "make_arg((void *){}, dsa_{})",
                                self.name_seq(id),
                                self.cur_level()
                            ));
                        } else {
                            code.append(self.dsa_ref(id));
                        }
                    }
                    self.advance()?;
                    return Ok(code);
                }
                if f.contains(IdentFlags::STRING) {
                    let mut ok = true;
                    if let Some(a) = arg {
                        if !self.flags(a).contains(IdentFlags::STRING) {
                            let (an, pn, pl) = self.formal_context(a);
                            self.error(format!(
                                "formal string passed as actual parameter conflicts with kind of \
                                 formal parameter `{}' as specified in declaration of procedure \
                                 `{}' beginning at line {}",
                                an, pn, pl
                            ))?;
                            ok = false;
                        }
                    }
                    if ok {
                        code.append(format!("make_arg({}, NULL)", self.dsa_ref(id)));
                    }
                    self.advance()?;
                    return Ok(code);
                }
                // any other identifier is treated as an expression
            }
        }
        // the actual parameter is an expression, translated to a
        // thunk evaluated in the caller's environment
        let mut need_dsa = true;
        let mut shared: Option<u32> = None;
        if matches!(
            self.t_kind(),
            TokenKind::Real(_) | TokenKind::Int(_) | TokenKind::False | TokenKind::True
        ) && (self.ahead_is_delim(Delim::Comma) || self.ahead_is_delim(Delim::Right))
        {
            // a constant needs no DSA pointers; common constants
            // share one thunk per value
            need_dsa = false;
            if self.second() {
                let image = self.t_image();
                let key = match self.t_kind() {
                    TokenKind::Real(_) if image == "0.0" || image == ".0" => {
                        Some(ConstThunk::Real0)
                    }
                    TokenKind::Real(_) if image == "1.0" => Some(ConstThunk::Real1),
                    TokenKind::Int(_) if image == "0" => Some(ConstThunk::Int0),
                    TokenKind::Int(_) if image == "1" => Some(ConstThunk::Int1),
                    TokenKind::False => Some(ConstThunk::False),
                    TokenKind::True => Some(ConstThunk::True),
                    _ => None,
                };
                if let Some(k) = key {
                    let have = self.const_thunk_get(k);
                    if have != 0 {
                        shared = Some(have);
                        self.advance()?; // the constant
                    } else {
                        self.const_thunk_set(k, self.thunk_count + 1);
                    }
                }
            }
        }
        let mut ok = true;
        let thunk = match shared {
            Some(k) => k,
            None => {
                let ssn = self.t_line();
                let expr = self.expression()?;
                if self.second() {
                    if let Some(a) = arg {
                        let af = self.flags(a);
                        let (an, pn, pl) = self.formal_context(a);
                        if af.intersects(!(R | I | B | L | BV | BN)) {
                            self.error(format!(
                                "expression passed as actual parameter conflicts with kind of \
                                 formal parameter `{}' as specified in declaration of procedure \
                                 `{}' beginning at line {}",
                                an, pn, pl
                            ))?;
                            ok = false;
                        } else {
                            let actual =
                                IdentFlags::from_bits_truncate(expr.ty.flag_bits());
                            if !Self::types_match(actual, af, R | I | B | L) {
                                self.error(format!(
                                    "type of expression passed as actual parameter conflicts \
                                     with type of formal parameter `{}' as specified in \
                                     declaration of procedure `{}' beginning at line {}",
                                    an, pn, pl
                                ))?;
                                ok = false;
                            }
                        }
                    }
                    if ok {
                        self.emit_thunk(expr, ssn, need_dsa);
                    }
                }
                self.thunk_count
            }
        };
        if ok && self.second() {
            code.append(format!(
                "make_arg((void *)_thunk_{}, dsa_{})",
                thunk,
                self.cur_level()
            ));
        }
        Ok(code)
    }

    /// Generates a thunk evaluating `expr` and appends it to the
    /// final output code.
    fn emit_thunk(&mut self, expr: Code, ssn: u32, need_dsa: bool) {
        self.thunk_count += 1;
        self.emit
            .append(format!("static struct desc _thunk_{}(void)\n", self.thunk_count));
        self.emit
            .append(format!("{{     /* actual parameter at line {} */\n", ssn));
        self.emit.append("      struct desc res;\n");
        if need_dsa {
            self.emit_dsa_pointers();
            let e = self.emit_ssn(ssn);
            self.emit.catenate(e);
        }
        self.emit
            .append(format!("      res.lval = {};\n", expr.lval as i32));
        let (tag, member) = match expr.ty {
            ValType::Real => ('r', if expr.lval { "real_ptr" } else { "real_val" }),
            ValType::Bool => ('b', if expr.lval { "bool_ptr" } else { "bool_val" }),
            ValType::Label => ('l', "label"),
            // errors upstream leave a typeless fragment; the output
            // is discarded in that case
            ValType::Int | ValType::None => ('i', if expr.lval { "int_ptr" } else { "int_val" }),
        };
        self.emit.append(format!("      res.type = '{}';\n", tag));
        self.emit.append(format!("      res.u.{} = ", member));
        if expr.lval {
            self.emit.append("&(");
            self.emit.catenate(expr);
            self.emit.append(")");
        } else {
            self.emit.catenate(expr);
        }
        self.emit.append(";\n");
        self.emit.append("      return res;\n");
        self.emit.append("}\n");
        self.emit.append("\n");
    }

    /// Checks a procedure identifier passed as an actual parameter
    /// against its formal. The formal may be a formal procedure of
    /// compatible type and arity, or a simple typed formal (the
    /// identifier of a type procedure with no parameters is in
    /// itself an expression).
    fn check_proc_actual(
        &mut self,
        id: IdentId,
        arg: Option<IdentId>,
        name: &str,
    ) -> Outcome<bool> {
        let a = match arg {
            Some(a) => a,
            None => return Ok(true),
        };
        let f = self.flags(id);
        let af = self.flags(a);
        let (an, pn, pl) = self.formal_context(a);
        let simple = !af.intersects(!(R | I | B | BV | BN));
        if !(simple || af.contains(IdentFlags::PROC)) {
            self.error(format!(
                "procedure `{}' passed as actual parameter conflicts with kind of formal \
                 parameter `{}' as specified in declaration of procedure `{}' beginning at line \
                 {}",
                name, an, pn, pl
            ))?;
            return Ok(false);
        }
        if simple {
            // the actual must be a type procedure with an empty
            // formal parameter part
            if f.type_part().is_empty() || self.table.ident(id).dim > 0 {
                self.error(format!(
                    "procedure identifier `{}' that is not in itself a complete expression and \
                     passed as actual parameter conflicts with kind of formal parameter `{}' as \
                     specified in declaration of procedure `{}' beginning at line {}",
                    name, an, pn, pl
                ))?;
                return Ok(false);
            }
            if !Self::types_match(f, af, R | I | B) {
                self.error(format!(
                    "procedure identifier `{}' that is in itself a complete expression and \
                     passed as actual parameter conflicts with type of formal parameter `{}' as \
                     specified in declaration of procedure `{}' beginning at line {}",
                    name, an, pn, pl
                ))?;
                return Ok(false);
            }
            return Ok(true);
        }
        // formal procedure: check type and arity (deeper checking is
        // sometimes impossible, hence omitted)
        if !af.type_part().is_empty() && !Self::types_match(f, af, R | I | B) {
            self.error(format!(
                "type of procedure `{}' passed as actual parameter conflicts with type of formal \
                 procedure `{}' as specified in declaration of procedure `{}' beginning at line \
                 {}",
                name, an, pn, pl
            ))?;
            return Ok(false);
        }
        let adim = self.table.ident(id).dim;
        let fdim = self.table.ident(a).dim;
        if adim >= 0 && fdim >= 0 && adim != fdim {
            self.error(format!(
                "number of parameters of procedure `{}' passed as actual parameter not equal to \
                 number of parameters of formal procedure `{}' as implied in declaration of \
                 procedure `{}' beginning at line {}",
                name, an, pn, pl
            ))?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Parses a function designator (`stmt` clear) or procedure
    /// statement (`stmt` set); the two are syntactically identical.
    /// Emits `get_xxx((global_dsa = ..., id_n(p1, ..., pn)))`.
    pub(crate) fn function_designator(&mut self, stmt: bool) -> Outcome<Code> {
        let mut code = self.new_code();
        assert!(self.t_is_ident());
        let name = self.t_image();
        let proc = self.look_up(&name, false, self.t_line())?;
        if self.second() {
            let pf = self.flags(proc);
            if !pf.contains(IdentFlags::PROC) {
                self.error(format!("invalid use of `{}' as procedure identifier", name))?;
            }
            code.lval = false;
            code.ty = ValType::from_flags(pf.type_part());
            if pf.contains(IdentFlags::BLTIN) && (name == "inline" || name == "print") {
                self.error(format!(
                    "invalid use of pseudo procedure `{}' in function designator",
                    name
                ))?;
            } else if pf.contains(IdentFlags::PROC) && code.ty == ValType::None && !stmt {
                self.error(format!(
                    "invalid use of typeless procedure `{}' in function designator",
                    name
                ))?;
                code.ty = ValType::Int; // recover with some type
            }
            code.append(format!(
                "{}(",
                match code.ty {
                    ValType::Real => "get_real",
                    ValType::Int if pf.type_part().contains(I) => "get_int",
                    ValType::Bool => "get_bool",
                    _ => "", // typeless: plain parentheses
                }
            ));
            if pf.contains(BN) {
                let r = self.dsa_ref(proc);
                code.append(format!(
                    "(global_dsa = {}.arg2, (*(struct desc (*)()){}.arg1)(",
                    r, r
                ));
            } else {
                code.append(format!(
                    "(global_dsa = (void *)dsa_{}, {}(",
                    self.cur_level(),
                    self.name_seq(proc)
                ));
            }
        }
        self.advance()?; // id
        let list = self.t_delim(Delim::Left);
        let mut dim = 0;
        if list {
            // the formal list is available only for known local
            // procedures, and only on the second pass
            let formals: Option<Vec<IdentId>> = if self.second()
                && self.flags(proc).contains(IdentFlags::PROC)
                && !self.flags(proc).contains(BN)
            {
                let fb = self
                    .table
                    .proc_block_of(proc)
                    .expect("local procedure has its formal block");
                Some(self.table.block(fb).idents.clone())
            } else {
                None
            };
            self.advance()?; // (
            let mut k = 0;
            loop {
                let formal = formals.as_ref().and_then(|f| f.get(k)).copied();
                let actual = self.actual_parameter(formal)?;
                code.catenate(actual);
                dim += 1;
                k += 1;
                if !self.ext_comma()? {
                    break;
                }
                code.append(", ");
            }
            if !self.t_delim(Delim::Right) {
                self.error("missing right parenthesis after actual parameter list")?;
            }
        }
        // check the number of actual parameters
        if self.table.ident(proc).dim < 0 {
            self.table.ident_mut(proc).dim = dim;
        }
        if self.second()
            && self.flags(proc).contains(IdentFlags::PROC)
            && self.table.ident(proc).dim != dim
        {
            if self.flags(proc).contains(BN) {
                self.error(format!(
                    "number of parameters in function designator or procedure statement \
                     conflicts with earlier use of procedure `{}'",
                    name
                ))?;
            } else {
                let decl = self.table.ident(proc).ssn_decl;
                self.error(format!(
                    "number of parameters in function designator or procedure statement \
                     conflicts with declaration of procedure `{}' beginning at line {}",
                    name, decl
                ))?;
            }
        }
        if list && self.t_delim(Delim::Right) {
            self.advance()?; // )
        }
        code.append(")))");
        Ok(code)
    }
}

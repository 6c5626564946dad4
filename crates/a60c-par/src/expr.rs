//! Expression parsing and emission.
//!
//! The precedence ladder of the reference language, bottom up:
//! primary, factor (`^`), term (`*` `/` `%`), arithmetic expression
//! (unary and binary `+` `-`), relation, Boolean primary (`!`),
//! Boolean factor (`&`), Boolean term (`|`), implication (`->`),
//! simple expression (`==`), and the conditional form
//! `if E then SE else E`.
//!
//! Relational and Boolean operators are emitted as calls to runtime
//! macros rather than native C operators, so both operands are always
//! evaluated; C's short-circuiting would break call by name.

use a60c_lex::Delim;
use a60c_sym::IdentFlags;
use a60c_util::Outcome;

use a60c_gen::Code;

use crate::{Translator, ValType};

const R: IdentFlags = IdentFlags::REAL;
const I: IdentFlags = IdentFlags::INT;
const B: IdentFlags = IdentFlags::BOOL;
const L: IdentFlags = IdentFlags::LABEL;
const BV: IdentFlags = IdentFlags::BYVAL;
const BN: IdentFlags = IdentFlags::BYNAME;
const OW: IdentFlags = IdentFlags::OWN;

impl<'a> Translator<'a> {
    /// Wraps an integer fragment in a conversion to real.
    pub(crate) fn to_real(&self, x: &mut Code) {
        if self.second() && x.ty == ValType::Int {
            x.lval = false;
            x.ty = ValType::Real;
            x.prepend("int2real(");
            x.append(")");
        }
    }

    /// Wraps a real fragment in a conversion to integer (rounding).
    pub(crate) fn to_int(&self, x: &mut Code) {
        if self.second() && x.ty == ValType::Real {
            x.lval = false;
            x.ty = ValType::Int;
            x.prepend("real2int(");
            x.append(")");
        }
    }

    /// Generates the call-by-name evaluation of a formal parameter:
    /// `(global_dsa = arg.arg2, arg.arg1())`, yielding a value
    /// descriptor.
    pub(crate) fn call_by_name(&mut self, id: a60c_sym::IdentId) -> Code {
        let mut code = self.new_code();
        if self.second() {
            let r = self.dsa_ref(id);
            code.append(format!(
                "(global_dsa = {}.arg2, (*(struct desc (*)(void)){}.arg1)())",
                r, r
            ));
        }
        code
    }

    /// Parses `identifier [ subscript, ... ]`; emits
    /// `(*loc_xxx(dv, n, i1, ..., in))`.
    pub(crate) fn subscripted_variable(&mut self) -> Outcome<Code> {
        let mut code = self.new_code();
        assert!(self.t_is_ident());
        let name = self.t_image();
        let arr = self.look_up(&name, false, self.t_line())?;
        if self.second() && !self.flags(arr).contains(IdentFlags::ARRAY) {
            self.error(format!("invalid use of `{}' as array identifier", name))?;
        }
        // the call head is assembled once the subscript count is known
        let dv = if self.flags(arr).contains(OW) {
            self.name_seq(arr)
        } else {
            self.dsa_ref(arr)
        };
        if self.second() {
            code.lval = true;
            code.ty = ValType::from_flags(self.flags(arr).type_part());
        }
        self.advance()?; // id
        assert!(self.t_delim(Delim::BegSub));
        let mut subs = self.new_code();
        let mut dim = 0;
        loop {
            if dim == 9 {
                self.error("number of subscripts exceeds allowable maximum")?;
                dim = 0;
            }
            self.advance()?; // [ or ,
            let mut expr = self.expression()?;
            self.to_int(&mut expr);
            if self.second() && expr.ty != ValType::Int {
                self.error("invalid type of subscript expression")?;
                expr.ty = ValType::Int;
            }
            subs.catenate(expr);
            dim += 1;
            if !self.t_delim(Delim::Comma) {
                break;
            }
            subs.append(", ");
        }
        if !self.t_delim(Delim::EndSub) {
            self.error("missing right parenthesis in subscripted variable")?;
        }
        // check the subscript count against the array dimension
        if self.table.ident(arr).dim < 0 {
            self.table.ident_mut(arr).dim = dim;
        }
        if self.second()
            && self.flags(arr).contains(IdentFlags::ARRAY)
            && self.table.ident(arr).dim != dim
        {
            if self.flags(arr).intersects(BV | BN) {
                self.error(format!(
                    "number of subscripts in subscripted variable conflicts with earlier use of \
                     array `{}'",
                    name
                ))?;
            } else {
                let decl = self.table.ident(arr).ssn_decl;
                self.error(format!(
                    "number of subscripts in subscripted variable conflicts with declaration of \
                     array `{}' at line {}",
                    name, decl
                ))?;
            }
        }
        if self.t_delim(Delim::EndSub) {
            self.advance()?;
        }
        assert!((1..=9).contains(&dim));
        if self.second() {
            let loc = match code.ty {
                ValType::Real => "loc_real",
                ValType::Int => "loc_int",
                _ => "loc_bool",
            };
            code.append(format!("(*{}({}, {}, ", loc, dv, dim));
            code.catenate(subs);
            code.append("))");
        }
        Ok(code)
    }

    /// Parses `identifier [ expression ]` where the identifier is a
    /// switch; emits `(global_dsa = ..., id(k))` yielding a label
    /// value. Second pass only; the first pass parses the same text
    /// as a subscripted variable.
    pub(crate) fn switch_designator(&mut self) -> Outcome<Code> {
        assert!(self.second());
        assert!(self.t_is_ident());
        let name = self.t_image();
        let swit = self.look_up(&name, false, self.t_line())?;
        assert!(self.flags(swit).contains(IdentFlags::SWITCH));
        self.advance()?; // id
        assert!(self.t_delim(Delim::BegSub));
        // processed like a subscript list, since the first pass saw a
        // subscripted variable here
        let mut code;
        let mut dim = 0;
        loop {
            if dim == 1 {
                self.error(format!(
                    "invalid number of subscripts in switch designator for `{}'",
                    name
                ))?;
            }
            self.advance()?; // [ or ,
            let mut expr = self.expression()?;
            self.to_int(&mut expr);
            if expr.ty != ValType::Int {
                self.error("invalid type of subscript expression")?;
                expr.ty = ValType::Int;
            }
            code = expr;
            dim += 1;
            if !self.t_delim(Delim::Comma) {
                break;
            }
        }
        assert!(self.t_delim(Delim::EndSub));
        self.advance()?; // ]
        code.lval = false;
        code.ty = ValType::Label;
        if self.flags(swit).contains(BN) {
            let r = self.dsa_ref(swit);
            code.prepend(format!(
                "(global_dsa = {}.arg2, (*(struct label (*)(int)){}.arg1)(",
                r, r
            ));
        } else {
            code.prepend(format!(
                "(global_dsa = (void *)dsa_{}, {}(",
                self.cur_level(),
                self.name_seq(swit)
            ));
        }
        code.append("))");
        Ok(code)
    }

    /// Parses a primary expression: constant, identifier, subscripted
    /// variable, switch designator, function designator, or a
    /// parenthesized expression.
    pub(crate) fn primary(&mut self) -> Outcome<Code> {
        match self.t_kind().clone() {
            a60c_lex::TokenKind::Real(image) => {
                let mut code = self.new_code();
                if self.second() {
                    code.lval = false;
                    code.ty = ValType::Real;
                    // strip leading zeros (C would read them as octal)
                    // and rewrite the ten symbol as `e'; constants
                    // like `000#+123' or `#-321' need care
                    let bytes = image.as_bytes();
                    let mut p = 0;
                    while p < bytes.len() && bytes[p] == b'0' {
                        p += 1;
                    }
                    assert!(p < bytes.len());
                    if bytes[p] == b'#' && p != 0 {
                        p -= 1;
                    }
                    let ten_first = bytes[p] == b'#';
                    let tail = image[p..].replace('#', "e");
                    code.append(format!("{}{}", if ten_first { "1" } else { "" }, tail));
                }
                self.advance()?;
                Ok(code)
            }
            a60c_lex::TokenKind::Int(image) => {
                let mut code = self.new_code();
                if self.second() {
                    code.lval = false;
                    code.ty = ValType::Int;
                    let stripped = image.trim_start_matches('0');
                    let text = if stripped.is_empty() { "0" } else { stripped };
                    code.append(text.to_string());
                }
                self.advance()?;
                Ok(code)
            }
            a60c_lex::TokenKind::False | a60c_lex::TokenKind::True => {
                let mut code = self.new_code();
                if self.second() {
                    code.lval = false;
                    code.ty = ValType::Bool;
                    code.append(if matches!(self.t_kind(), a60c_lex::TokenKind::True) {
                        "true"
                    } else {
                        "false"
                    });
                }
                self.advance()?;
                Ok(code)
            }
            a60c_lex::TokenKind::Ident(name) => {
                let id = self.look_up(&name, false, self.t_line())?;
                self.peek()?;
                if self.ahead_is_delim(Delim::BegSub) {
                    // subscripted variable or switch designator; the
                    // first pass cannot tell them apart yet
                    if self.first() || !self.flags(id).contains(IdentFlags::SWITCH) {
                        return self.subscripted_variable();
                    }
                    return self.switch_designator();
                }
                if self.ahead_is_delim(Delim::Left) {
                    return self.function_designator(false);
                }
                // plain identifier, or a function designator with an
                // empty parameter part
                if self.second() && self.flags(id).contains(IdentFlags::PROC) {
                    return self.function_designator(false);
                }
                let mut code = self.new_code();
                if self.second() {
                    let f = self.flags(id);
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
                        code.lval = true;
                        code.ty = ValType::from_flags(f.type_part());
                        if f.contains(OW) {
                            code.append(self.name_seq(id));
                        } else {
                            code.append(self.dsa_ref(id));
                        }
                    } else if f == R | BN {
                        code.lval = false;
                        code.ty = ValType::Real;
                        code.append("get_real(");
                        let cbn = self.call_by_name(id);
                        code.catenate(cbn);
                        code.append(")");
                    } else if f == I | BN {
                        code.lval = false;
                        code.ty = ValType::Int;
                        code.append("get_int(");
                        let cbn = self.call_by_name(id);
                        code.catenate(cbn);
                        code.append(")");
                    } else if f == B | BN {
                        code.lval = false;
                        code.ty = ValType::Bool;
                        code.append("get_bool(");
                        let cbn = self.call_by_name(id);
                        code.catenate(cbn);
                        code.append(")");
                    } else if f == L {
                        // a local label used as a designational value
                        code.lval = false;
                        code.ty = ValType::Label;
                        let blk = self.table.ident(id).block;
                        code.append(format!(
                            "make_label(dsa_{}->jump_{}, {})",
                            self.table.dsa_level(id),
                            self.table.block_level(blk),
                            self.table.ident(id).dim
                        ));
                    } else if f == L | BV {
                        code.lval = false;
                        code.ty = ValType::Label;
                        code.append(self.dsa_ref(id));
                    } else if f == L | BN {
                        code.lval = false;
                        code.ty = ValType::Label;
                        code.append("get_label(");
                        let cbn = self.call_by_name(id);
                        code.catenate(cbn);
                        code.append(")");
                    } else {
                        self.error(format!(
                            "invalid use of identifier `{}' as expression operand",
                            name
                        ))?;
                        code.lval = false;
                        code.ty = ValType::Int;
                    }
                }
                self.advance()?;
                Ok(code)
            }
            a60c_lex::TokenKind::Delim(Delim::Left) => {
                self.advance()?; // (
                let mut code = self.expression()?;
                if self.t_delim(Delim::Right) {
                    self.advance()?;
                } else {
                    self.error("missing right parenthesis after expression")?;
                }
                if self.second() {
                    code.lval = false;
                    code.prepend("(");
                    code.append(")");
                }
                Ok(code)
            }
            a60c_lex::TokenKind::Str(_) => {
                self.error("invalid use of string as expression operand")?;
                self.advance()?;
                Ok(self.new_code())
            }
            a60c_lex::TokenKind::Delim(_) => {
                let image = self.t_image();
                self.error(format!(
                    "invalid use of delimiter `{}' as expression operand",
                    image
                ))?;
                self.advance()?;
                Ok(self.new_code())
            }
            a60c_lex::TokenKind::Undef => unreachable!("current token is always defined"),
        }
    }

    /// `factor ::= primary | primary ^ factor` (right-associative).
    pub(crate) fn factor(&mut self) -> Outcome<Code> {
        let mut x = self.primary()?;
        if self.t_delim(Delim::Power) {
            if self.second() && !x.ty.is_arith() {
                self.error("operand preceding `^' is not of arithmetic type")?;
                x.ty = ValType::Int;
            }
            self.advance()?; // ^
            let mut y = self.factor()?;
            if self.second() {
                if !y.ty.is_arith() {
                    self.error("operand following `^' is not of arithmetic type")?;
                    y.ty = ValType::Int;
                }
                x.lval = false;
                if y.ty == ValType::Real {
                    self.to_real(&mut x);
                    x.prepend("expr(");
                } else if x.ty == ValType::Real {
                    x.prepend("expn(");
                } else {
                    x.prepend("expi(");
                }
                x.append(", ");
                x.catenate(y);
                x.append(")");
            }
        }
        Ok(x)
    }

    /// `term ::= factor { (* | / | %) factor }`; `%` requires integer
    /// operands and emits C integer division.
    pub(crate) fn term(&mut self) -> Outcome<Code> {
        let mut x = self.factor()?;
        while self.t_delim(Delim::Times) || self.t_delim(Delim::Slash) || self.t_delim(Delim::IntDiv)
        {
            let op = if self.t_delim(Delim::Times) {
                Delim::Times
            } else if self.t_delim(Delim::Slash) {
                Delim::Slash
            } else {
                Delim::IntDiv
            };
            if self.second() {
                if !x.ty.is_arith() {
                    self.error("operand preceding `*', `/', or `%' is not of arithmetic type")?;
                    x.ty = ValType::Int;
                }
                if op == Delim::IntDiv && x.ty != ValType::Int {
                    self.error("operand preceding `%' is not of integer type")?;
                    x.ty = ValType::Int;
                }
            }
            self.advance()?;
            let mut y = self.factor()?;
            if self.second() {
                if !y.ty.is_arith() {
                    self.error("operand following `*', `/', or `%' is not of arithmetic type")?;
                    y.ty = ValType::Int;
                }
                if op == Delim::IntDiv && y.ty != ValType::Int {
                    self.error("operand following `%' is not of integer type")?;
                    y.ty = ValType::Int;
                }
                x.lval = false;
                if x.ty == ValType::Real || op == Delim::Slash || y.ty == ValType::Real {
                    self.to_real(&mut x);
                    self.to_real(&mut y);
                }
                x.append(format!(" {} ", if op == Delim::Times { '*' } else { '/' }));
                x.catenate(y);
            }
        }
        Ok(x)
    }

    /// Arithmetic expression with optional unary sign and binary
    /// `+`/`-`.
    pub(crate) fn arith_expression(&mut self) -> Outcome<Code> {
        let mut x;
        if self.t_delim(Delim::Plus) || self.t_delim(Delim::Minus) {
            let op = if self.t_delim(Delim::Plus) { '+' } else { '-' };
            self.advance()?;
            x = self.term()?;
            if self.second() {
                if !x.ty.is_arith() {
                    self.error("operand following unary `+' or `-' is not of arithmetic type")?;
                    x.ty = ValType::Int;
                }
                x.lval = false;
                x.prepend(op.to_string());
            }
        } else {
            x = self.term()?;
        }
        while self.t_delim(Delim::Plus) || self.t_delim(Delim::Minus) {
            let op = if self.t_delim(Delim::Plus) { '+' } else { '-' };
            if self.second() && !x.ty.is_arith() {
                self.error("operand preceding `+' or `-' is not of arithmetic type")?;
                x.ty = ValType::Int;
            }
            self.advance()?;
            let mut y = self.term()?;
            if self.second() {
                if !y.ty.is_arith() {
                    self.error("operand following `+' or `-' is not of arithmetic type")?;
                    y.ty = ValType::Int;
                }
                x.lval = false;
                if x.ty == ValType::Real || y.ty == ValType::Real {
                    self.to_real(&mut x);
                    self.to_real(&mut y);
                }
                x.append(format!(" {} ", op));
                x.catenate(y);
            }
        }
        Ok(x)
    }

    /// Relation over arithmetic expressions; emitted through runtime
    /// macros. Nesting two relational operators is an error, parsed
    /// anyway to recover.
    pub(crate) fn relation(&mut self) -> Outcome<Code> {
        let mut x = self.arith_expression()?;
        let mut nested = false;
        loop {
            let mac = if self.t_delim(Delim::Less) {
                "less"
            } else if self.t_delim(Delim::NotGreater) {
                "notgreater"
            } else if self.t_delim(Delim::Equal) {
                "equal"
            } else if self.t_delim(Delim::NotLess) {
                "notless"
            } else if self.t_delim(Delim::Greater) {
                "greater"
            } else if self.t_delim(Delim::NotEqual) {
                "notequal"
            } else {
                break;
            };
            if nested {
                self.error("invalid use of relational operator")?;
            }
            nested = true;
            if self.second() && !x.ty.is_arith() {
                self.error("operand preceding relational operator is not of arithmetic type")?;
                x.ty = ValType::Int;
            }
            self.advance()?;
            let mut y = self.arith_expression()?;
            if self.second() {
                if !y.ty.is_arith() {
                    self.error("operand following relational operator is not of arithmetic type")?;
                    y.ty = ValType::Int;
                }
                if x.ty == ValType::Real || y.ty == ValType::Real {
                    self.to_real(&mut x);
                    self.to_real(&mut y);
                }
                x.lval = false;
                x.ty = ValType::Bool;
                x.prepend(format!("{}(", mac));
                x.append(", ");
                x.catenate(y);
                x.append(")");
            }
        }
        Ok(x)
    }

    /// Boolean primary with optional `!`.
    pub(crate) fn bool_primary(&mut self) -> Outcome<Code> {
        if !self.t_delim(Delim::Not) {
            return self.relation();
        }
        self.advance()?; // !
        let mut x = self.relation()?;
        if self.second() {
            if x.ty != ValType::Bool {
                self.error("operand following `!' is not of Boolean type")?;
                x.ty = ValType::Bool;
            }
            x.lval = false;
            x.prepend("not(");
            x.append(")");
        }
        Ok(x)
    }

    /// One tier of the Boolean operator ladder: a left-recursive
    /// chain of `delim` over `inner` operands, emitted through the
    /// runtime macro `mac`.
    fn bool_chain(
        &mut self,
        delim: Delim,
        mac: &str,
        inner: fn(&mut Self) -> Outcome<Code>,
    ) -> Outcome<Code> {
        let op = delim.image();
        let mut x = inner(self)?;
        while self.t_delim(delim) {
            if self.second() && x.ty != ValType::Bool {
                self.error(format!("operand preceding `{}' is not of Boolean type", op))?;
                x.ty = ValType::Bool;
            }
            self.advance()?;
            let mut y = inner(self)?;
            if self.second() {
                if y.ty != ValType::Bool {
                    self.error(format!("operand following `{}' is not of Boolean type", op))?;
                    y.ty = ValType::Bool;
                }
                x.lval = false;
                x.prepend(format!("{}(", mac));
                x.append(", ");
                x.catenate(y);
                x.append(")");
            }
        }
        Ok(x)
    }

    pub(crate) fn bool_factor(&mut self) -> Outcome<Code> {
        self.bool_chain(Delim::And, "and", Self::bool_primary)
    }

    pub(crate) fn bool_term(&mut self) -> Outcome<Code> {
        self.bool_chain(Delim::Or, "or", Self::bool_factor)
    }

    pub(crate) fn implication(&mut self) -> Outcome<Code> {
        self.bool_chain(Delim::Impl, "impl", Self::bool_term)
    }

    pub(crate) fn simple_expr(&mut self) -> Outcome<Code> {
        self.bool_chain(Delim::Equiv, "equiv", Self::implication)
    }

    /// General expression: a simple expression or the conditional
    /// form `if E then SE else E`, emitted as a C conditional with
    /// arithmetic upconversion between the branches.
    pub(crate) fn expression(&mut self) -> Outcome<Code> {
        if !self.t_delim(Delim::If) {
            return self.simple_expr();
        }
        self.advance()?; // if
        let mut x = self.expression()?;
        if !self.t_delim(Delim::Then) {
            self.error("missing `then' delimiter")?;
        }
        if self.second() && x.ty != ValType::Bool {
            self.error("expression following `if' is not of Boolean type")?;
        }
        if self.t_delim(Delim::Then) {
            self.advance()?;
        }
        let mut sae = self.simple_expr()?; // expression before else
        if self.t_delim(Delim::Else) {
            self.advance()?;
        } else {
            self.error("missing `else' delimiter")?;
        }
        let mut ae = self.expression()?; // expression after else
        if self.second() {
            if sae.ty == ValType::Int && ae.ty == ValType::Real {
                self.to_real(&mut sae);
            }
            if sae.ty == ValType::Real && ae.ty == ValType::Int {
                self.to_real(&mut ae);
            }
            if sae.ty != ae.ty {
                self.error("expressions before and after 'else' incompatible")?;
            }
            x.lval = false;
            x.ty = sae.ty;
            x.prepend("((");
            x.append(") ? (");
            x.catenate(sae);
            x.append(") : (");
            x.catenate(ae);
            x.append("))");
        }
        Ok(x)
    }
}

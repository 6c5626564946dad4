//! Declaration parsing and emission.
//!
//! Type declarations mark identifiers (own simple variables become
//! file-scope statics initialized to the zero of their type), array
//! declarations allocate through the runtime at block entry, switch
//! declarations compile to a case-dispatch routine returning a label
//! value, and procedure declarations compile to full C functions.
//! The main program is treated as a procedure named `main_program`
//! with an implicit heading.

use a60c_lex::Delim;
use a60c_sym::{BlockId, IdentFlags, IdentId};
use a60c_util::Outcome;

use a60c_gen::{emit_proc_head, Code};

use crate::{Translator, ValType};

const R: IdentFlags = IdentFlags::REAL;
const I: IdentFlags = IdentFlags::INT;
const B: IdentFlags = IdentFlags::BOOL;
const L: IdentFlags = IdentFlags::LABEL;
const A: IdentFlags = IdentFlags::ARRAY;
const SW: IdentFlags = IdentFlags::SWITCH;
const P: IdentFlags = IdentFlags::PROC;
const ST: IdentFlags = IdentFlags::STRING;
const BV: IdentFlags = IdentFlags::BYVAL;
const BN: IdentFlags = IdentFlags::BYNAME;
const OW: IdentFlags = IdentFlags::OWN;

impl<'a> Translator<'a> {
    /// Whether the current token begins a declaration.
    pub(crate) fn is_declaration(&self) -> bool {
        self.t_delim(Delim::Array)
            || self.t_delim(Delim::Boolean)
            || self.t_delim(Delim::Integer)
            || self.t_delim(Delim::Own)
            || self.t_delim(Delim::Procedure)
            || self.t_delim(Delim::Real)
            || self.t_delim(Delim::Switch)
    }

    /// Parses one declaration, dispatching on the declarator.
    pub(crate) fn declaration(&mut self) -> Outcome<Code> {
        assert!(self.is_declaration());
        let mut flags = IdentFlags::empty();
        if self.t_delim(Delim::Real) || self.t_delim(Delim::Integer) || self.t_delim(Delim::Boolean)
        {
            flags = if self.t_delim(Delim::Real) {
                R
            } else if self.t_delim(Delim::Integer) {
                I
            } else {
                B
            };
            self.advance()?;
            if self.t_delim(Delim::Array) {
                flags |= A;
                self.advance()?;
            } else if self.t_delim(Delim::Procedure) {
                flags |= P;
                self.advance()?;
            }
        } else if self.t_delim(Delim::Array) {
            flags = R | A;
            self.advance()?;
        } else if self.t_delim(Delim::Own) {
            flags = OW;
            self.advance()?;
            if self.t_delim(Delim::Real) {
                flags |= R;
                self.advance()?;
            } else if self.t_delim(Delim::Integer) {
                flags |= I;
                self.advance()?;
            } else if self.t_delim(Delim::Boolean) {
                flags |= B;
                self.advance()?;
            }
            if self.t_delim(Delim::Array) {
                if flags == OW {
                    flags |= R;
                }
                flags |= A;
                self.advance()?;
            }
            if flags == OW {
                self.error("missing declarator after 'own'")?;
                flags |= R;
            }
        } else if self.t_delim(Delim::Switch) {
            flags = SW;
            self.advance()?;
        } else if self.t_delim(Delim::Procedure) {
            flags = P;
            self.advance()?;
        }
        if flags.contains(A) {
            self.array_declaration(flags)
        } else if flags.contains(SW) {
            self.switch_declaration()?;
            Ok(self.new_code())
        } else if flags.contains(P) {
            self.procedure_declaration(flags)?;
            Ok(self.new_code())
        } else {
            self.type_declaration(flags)?;
            Ok(self.new_code())
        }
    }

    /// `<type> id, id, ...` - simple variable declarations. Own
    /// variables emit a static C definition immediately.
    pub(crate) fn type_declaration(&mut self, flags: IdentFlags) -> Outcome<()> {
        loop {
            if !self.t_is_ident() {
                self.error("missing simple variable identifier")?;
                break;
            }
            let name = self.t_image();
            let id = self.look_up(&name, true, self.t_line())?;
            self.table.ident_mut(id).flags = flags;
            if flags.contains(OW) {
                let n = self.name_seq(id);
                if flags.contains(R) {
                    self.emit.append(format!("static double {} = 0.0;\n\n", n));
                } else if flags.contains(I) {
                    self.emit.append(format!("static int {} = 0;\n\n", n));
                } else {
                    self.emit.append(format!("static bool {} = false;\n\n", n));
                }
            }
            self.advance()?;
            if !self.t_delim(Delim::Comma) {
                break;
            }
            self.advance()?;
        }
        if !self.t_delim(Delim::Semicolon) {
            self.error("missing semicolon after type declaration")?;
            self.skip_to_semicolon()?;
        }
        // the semicolon itself is processed by the caller
        Ok(())
    }

    /// A bound expression of an own array: an optionally signed
    /// integer literal.
    pub(crate) fn own_bound(&mut self) -> Outcome<Code> {
        let mut code = self.new_code();
        if self.t_delim(Delim::Plus) {
            code.append("+");
            self.advance()?;
        } else if self.t_delim(Delim::Minus) {
            code.append("-");
            self.advance()?;
        }
        if self.t_is_int() {
            self.peek()?;
        }
        if !(self.t_is_int()
            && (self.ahead_is_delim(Delim::Colon)
                || self.ahead_is_delim(Delim::Comma)
                || self.ahead_is_delim(Delim::EndSub)))
        {
            self.error("invalid bound expression for own array")?;
        }
        let expr = self.expression()?;
        if self.second() {
            code.ty = expr.ty;
        }
        code.catenate(expr);
        Ok(code)
    }

    /// `[own] [<type>] array seg, seg, ...` - array declarations.
    ///
    /// The bound-expression context flag is saved and restored around
    /// the whole parse, so recursive expression parsing cannot leak
    /// the Modified Report 5.2.4.2 check.
    pub(crate) fn array_declaration(&mut self, flags: IdentFlags) -> Outcome<Code> {
        let saved = self.array_bound;
        self.array_bound = true;
        let result = self.array_declaration_body(flags);
        self.array_bound = saved;
        result
    }

    fn array_declaration_body(&mut self, flags: IdentFlags) -> Outcome<Code> {
        let mut code = self.new_code();
        'segments: loop {
            // the identifiers of one array segment
            let mut seg: Vec<IdentId> = Vec::new();
            loop {
                if !self.t_is_ident() {
                    self.error("missing array identifier")?;
                    self.skip_to_semicolon()?;
                    return Ok(code);
                }
                if seg.len() == 100 {
                    self.error("too many identifiers in array segment")?;
                    seg.truncate(0);
                }
                let name = self.t_image();
                let id = self.look_up(&name, true, self.t_line())?;
                self.table.ident_mut(id).flags = flags;
                seg.push(id);
                self.advance()?;
                if flags.contains(OW) {
                    self.emit.append(format!(
                        "static struct dv *{} = NULL;\n\n",
                        self.name_seq(id)
                    ));
                }
                if !self.t_delim(Delim::Comma) {
                    break;
                }
                self.advance()?;
            }
            if !self.t_delim(Delim::BegSub) {
                self.error("missing left parenthesis after array segment")?;
                self.skip_to_semicolon()?;
                return Ok(code);
            }
            // translate the bound list; the allocation call head is
            // assembled once the dimension is known
            let last = *seg.last().expect("segment has an identifier");
            let e = self.emit_ssn(self.table.ident(last).ssn_decl);
            code.catenate(e);
            let ty_char = if flags.contains(R) {
                'r'
            } else if flags.contains(I) {
                'i'
            } else {
                'b'
            };
            let mut bounds = self.new_code();
            self.advance()?; // [
            let mut dim = 0;
            loop {
                if dim == 9 {
                    self.error("array dimension exceeds allowable maximum")?;
                    dim = 0;
                }
                dim += 1;
                let mut bound = if flags.contains(OW) {
                    self.own_bound()?
                } else {
                    self.expression()?
                };
                if self.second() {
                    self.to_int(&mut bound);
                    if bound.ty != ValType::Int {
                        self.error("bound expression is not of arithmetic type")?;
                        bound.ty = ValType::Int;
                    }
                    bounds.catenate(bound);
                    bounds.append(", ");
                }
                if !self.t_delim(Delim::Colon) {
                    self.error("missing colon between bound expressions")?;
                    self.skip_to_semicolon()?;
                    return Ok(code);
                }
                self.advance()?; // :
                let mut bound = if flags.contains(OW) {
                    self.own_bound()?
                } else {
                    self.expression()?
                };
                if self.second() {
                    self.to_int(&mut bound);
                    if bound.ty != ValType::Int {
                        self.error("bound expression is not of arithmetic type")?;
                        bound.ty = ValType::Int;
                    }
                    bounds.catenate(bound);
                    bounds.append(if self.t_delim(Delim::Comma) { ", " } else { ");\n" });
                }
                if !self.t_delim(Delim::Comma) {
                    break;
                }
                self.advance()?;
            }
            if !self.t_delim(Delim::EndSub) {
                self.error("missing right parenthesis after bound list")?;
                self.skip_to_semicolon()?;
                return Ok(code);
            }
            self.advance()?; // ]
            // now the dimension of the segment is known
            assert!((1..=9).contains(&dim));
            for &id in &seg {
                self.table.ident_mut(id).dim = dim;
            }
            if flags.contains(OW) {
                let n = self.name_seq(last);
                code.append(format!(
                    "      if ({} == NULL) {} = own_array('{}', {}, ",
                    n, n, ty_char, dim
                ));
            } else {
                code.append(format!(
                    "      dsa_{}->{} = alloc_array('{}', {}, ",
                    self.cur_level(),
                    self.name_seq(last),
                    ty_char,
                    dim
                ));
            }
            code.catenate(bounds);
            // the other arrays of the segment share the dimensions of
            // the one just allocated
            for k in (0..seg.len() - 1).rev() {
                let id = seg[k];
                let proto = seg[k + 1];
                let e = self.emit_ssn(self.table.ident(id).ssn_decl);
                code.catenate(e);
                if flags.contains(OW) {
                    let n = self.name_seq(id);
                    code.append(format!(
                        "      if ({} == NULL) {} = own_same('{}', {});\n",
                        n,
                        n,
                        ty_char,
                        self.name_seq(proto)
                    ));
                } else {
                    code.append(format!(
                        "      dsa_{}->{} = alloc_same('{}', dsa_{}->{});\n",
                        self.cur_level(),
                        self.name_seq(id),
                        ty_char,
                        self.cur_level(),
                        self.name_seq(proto)
                    ));
                }
            }
            if self.t_delim(Delim::Comma) {
                self.advance()?;
                continue 'segments;
            }
            break;
        }
        if !self.t_delim(Delim::Semicolon) {
            self.error("missing semicolon after array declaration")?;
            self.skip_to_semicolon()?;
        }
        Ok(code)
    }

    /// `switch id := e1, e2, ...` - compiled to a separate routine
    /// dispatching on the subscript value.
    pub(crate) fn switch_declaration(&mut self) -> Outcome<()> {
        if !self.t_is_ident() {
            self.error("missing switch identifier")?;
            self.skip_to_semicolon()?;
            return Ok(());
        }
        let name = self.t_image();
        let id = self.look_up(&name, true, self.t_line())?;
        self.table.ident_mut(id).flags = SW;
        self.advance()?;
        if !self.t_delim(Delim::Assign) {
            self.error("missing `:=' after switch identifier")?;
            self.skip_to_semicolon()?;
            return Ok(());
        }
        self.advance()?;
        let decl_line = self.table.ident(id).ssn_decl;
        self.emit.append(format!(
            "static struct label {}(int kase)\n",
            self.name_seq(id)
        ));
        self.emit.append(format!(
            "{{     /* switch declaration at line {} */\n",
            decl_line
        ));
        self.emit_dsa_pointers();
        let e = self.emit_ssn(decl_line);
        self.emit.catenate(e);
        self.emit.append("      switch (kase)\n");
        let mut dim = 0;
        loop {
            let expr = self.expression()?;
            dim += 1;
            if self.second() && expr.ty != ValType::Label {
                self.error("expression in switch list is not of label type")?;
            }
            self.emit.append(format!(
                "      {}  case {}: dsa_{}->line = {}; return ",
                if dim == 1 { "{" } else { " " },
                dim,
                self.cur_level(),
                self.t_line()
            ));
            self.emit.catenate(expr);
            self.emit.append(";\n");
            if !self.t_delim(Delim::Comma) {
                break;
            }
            self.advance()?;
        }
        self.emit
            .append("         default: fault(\"switch designator undefined\");\n");
        self.emit.append("      }\n");
        self.emit.append("      return make_label(NULL, 0);\n");
        self.emit.append("}\n\n");
        if !self.t_delim(Delim::Semicolon) {
            self.error("missing semicolon after switch declaration")?;
            self.skip_to_semicolon()?;
        }
        Ok(())
    }

    /// Parses a procedure declaration or the main program (which is
    /// treated as a procedure with the implicit heading
    /// `procedure main_program;`).
    pub(crate) fn procedure_declaration(&mut self, mut flags: IdentFlags) -> Outcome<()> {
        // when the previous token is not `procedure', the main
        // program is being parsed
        let is_main = !self.prev_is_delim(Delim::Procedure);
        let proc = if !is_main {
            if self.t_is_ident() {
                let name = self.t_image();
                let p = self.look_up(&name, true, self.t_line())?;
                self.advance()?;
                p
            } else {
                let dummy = format!("p_{}", self.t_line());
                self.error(format!(
                    "missing procedure identifier after `procedure'; dummy identifier `{}' used",
                    dummy
                ))?;
                self.look_up(&dummy, true, self.t_line())?
            }
        } else {
            assert_eq!(self.table.cur(), BlockId::ENV);
            self.look_up("main_program", true, self.t_line())?
        };
        self.table.ident_mut(proc).flags = flags;
        // the dummy procedure block holds the formal parameters
        let prolog = self.enter_block(Some(proc), self.t_line());
        let mut dim = 0;
        if !is_main {
            self.procedure_heading(proc, &mut dim)?;
        }
        // now the number of formal parameters is known
        self.table.ident_mut(proc).dim = dim;
        // a body consisting of `code' is supplied elsewhere; only the
        // prototype is used
        if self.t_delim(Delim::Code) {
            assert!(!is_main);
            let surr = self.table.block(self.table.cur()).surr.expect("not outermost");
            if self.table.block(surr).seqn != 0 {
                self.error("invalid declaration of code procedure inside block")?;
            }
            flags |= IdentFlags::CODE;
            self.table.ident_mut(proc).flags = flags;
            drop(prolog);
            let _ = self.leave_block();
            self.advance()?; // code
            if !self.t_delim(Delim::Semicolon) {
                self.error("missing semicolon after 'code'")?;
                self.skip_to_semicolon()?;
            }
            return Ok(());
        }
        // code for internal procedures must precede code for the
        // surrounding procedure, so nothing is emitted until the
        // whole declaration is processed
        let mut code = self.new_code();
        if self.second() {
            let pname = self.table.ident(proc).name.clone();
            let pseq = self.table.block(self.table.ident(proc).block).seqn;
            code.append(format!("{{     struct dsa_{}_{} my_dsa;\n", pname, pseq));
            // DSA pointers for this procedure and all enclosing ones
            let mut level = self.table.dsa_level(proc) + 1;
            let mut b = self.table.current();
            while let Some(bid) = b {
                if let Some(bp) = self.table.block(bid).proc {
                    let bname = self.table.ident(bp).name.clone();
                    let bseq = self.table.block(self.table.ident(bp).block).seqn;
                    code.append(format!(
                        "      register struct dsa_{}_{} *dsa_{} = ",
                        bname, bseq, level
                    ));
                    if bp == proc {
                        code.append("&my_dsa;\n");
                    } else {
                        code.append(format!("(void *)global_dsa->vector[{}];\n", level));
                    }
                    level -= 1;
                }
                b = self.table.block(bid).surr;
            }
            code.append(format!("      my_dsa.proc = \"{}\";\n", pname));
            code.append(format!(
                "      my_dsa.file = \"{}\";\n",
                escape_filename(self.diag.filename())
            ));
            code.append(format!(
                "      my_dsa.line = {};\n",
                self.table.ident(proc).ssn_decl
            ));
            code.append(
                "      my_dsa.parent = active_dsa, active_dsa = (struct dsa *)&my_dsa;\n",
            );
            // the display of this procedure
            let level = self.table.dsa_level(proc) + 1;
            for k in 0..=level {
                code.append(format!("      my_dsa.vector[{}] = (void *)dsa_{};\n", k, k));
            }
            code.catenate(prolog);
            self.copy_formal_parameters(&mut code);
            code.append(format!(
                "      dsa_{}->new_top_{} = stack_top;\n",
                self.cur_level(),
                self.table.block_level(self.table.cur())
            ));
        }
        // the body is always enclosed in a dummy block, since it may
        // be a statement declaring labels
        let eb = self.enter_block(None, self.t_line());
        code.catenate(eb);
        code.append(format!(
            "      dsa_{}->new_top_{} = stack_top;\n",
            self.cur_level(),
            self.table.block_level(self.table.cur())
        ));
        let ll = self.label_list()?;
        code.catenate(ll);
        if is_main && !self.t_delim(Delim::Begin) {
            self.error("missing bracket 'begin'")?;
        }
        let st = self.statement()?;
        code.catenate(st);
        let lv = self.leave_block();
        code.catenate(lv);
        let lv = self.leave_block();
        code.catenate(lv);
        if self.second() {
            code.append("      my_dsa.retval.lval = 0;\n");
            let tag = match ValType::from_flags(self.flags(proc).type_part()) {
                ValType::Real => "'r'",
                ValType::Int => "'i'",
                ValType::Bool => "'b'",
                _ => "0",
            };
            code.append(format!("      my_dsa.retval.type = {};\n", tag));
            code.append("      active_dsa = my_dsa.parent;\n");
            code.append("      return my_dsa.retval;\n");
            code.append("}\n\n");
            emit_proc_head(&self.table, proc, false, &mut self.emit);
            self.emit.catenate(code);
        }
        if !is_main && !self.t_delim(Delim::Semicolon) {
            self.error("missing semicolon after procedure declaration")?;
            self.skip_to_semicolon()?;
        }
        if is_main && self.t_delim(Delim::Semicolon) {
            self.warning("semicolon found after program");
        }
        Ok(())
    }

    /// The formal parameter part, value part, and specification part
    /// of a procedure heading.
    fn procedure_heading(&mut self, proc: IdentId, dim: &mut i32) -> Outcome<()> {
        let proc_name = self.table.ident(proc).name.clone();
        if self.t_delim(Delim::Left) {
            self.advance()?;
            loop {
                if !self.t_is_ident() {
                    self.error("missing formal parameter identifier")?;
                    break;
                }
                if self.first() {
                    let name = self.t_image();
                    let id = self.look_up(&name, false, self.t_line())?;
                    if self.flags(id).contains(BN) {
                        self.error(format!(
                            "formal parameter `{}' repeated in formal parameter list",
                            name
                        ))?;
                    }
                    self.table.ident_mut(id).flags = BN;
                    // Modified Report 5.4.3: the formal list must not
                    // contain the procedure's own identifier
                    if name == proc_name {
                        self.error(format!(
                            "formal parameter identifier `{}' is the same as procedure \
                             identifier",
                            name
                        ))?;
                    }
                }
                *dim += 1;
                self.advance()?;
                if !self.ext_comma()? {
                    break;
                }
            }
            if self.t_delim(Delim::Right) {
                self.advance()?;
            } else {
                self.error("missing right parenthesis after formal parameter list")?;
            }
        }
        if !self.t_delim(Delim::Semicolon) {
            self.error("missing semicolon after formal parameter part")?;
            self.skip_to_semicolon()?;
        }
        self.advance()?; // ;
        loop {
            // optional value part
            if self.t_delim(Delim::Value) {
                loop {
                    self.advance()?; // value or ,
                    if !self.t_is_ident() {
                        self.error("missing formal parameter identifier")?;
                        break;
                    }
                    if self.first() {
                        let name = self.t_image();
                        let id = self.look_up(&name, false, self.t_line())?;
                        if self.flags(id).is_empty() {
                            self.error(format!(
                                "identifier `{}' missing from formal parameter list",
                                name
                            ))?;
                        }
                        if self.flags(id).contains(BV) {
                            self.error(format!(
                                "formal parameter `{}' repeated in value part",
                                name
                            ))?;
                        }
                        self.table.ident_mut(id).flags = BV;
                    }
                    self.advance()?;
                    if !self.t_delim(Delim::Comma) {
                        break;
                    }
                }
                if !self.t_delim(Delim::Semicolon) {
                    self.error("missing semicolon after value part")?;
                    self.skip_to_semicolon()?;
                }
                self.advance()?; // ;
            }
            // specification part
            while self.t_delim(Delim::Array)
                || self.t_delim(Delim::Boolean)
                || self.t_delim(Delim::Integer)
                || self.t_delim(Delim::Label)
                || self.t_delim(Delim::Procedure)
                || self.t_delim(Delim::Real)
                || self.t_delim(Delim::StringKw)
                || self.t_delim(Delim::Switch)
            {
                let spec;
                if self.t_delim(Delim::Real)
                    || self.t_delim(Delim::Integer)
                    || self.t_delim(Delim::Boolean)
                {
                    let mut f = if self.t_delim(Delim::Real) {
                        R
                    } else if self.t_delim(Delim::Integer) {
                        I
                    } else {
                        B
                    };
                    self.advance()?;
                    if self.t_delim(Delim::Array) {
                        f |= A;
                        self.advance()?;
                    } else if self.t_delim(Delim::Procedure) {
                        f |= P;
                        self.advance()?;
                    }
                    spec = f;
                } else if self.t_delim(Delim::Label) {
                    spec = L;
                    self.advance()?;
                } else if self.t_delim(Delim::Array) {
                    spec = R | A;
                    self.advance()?;
                } else if self.t_delim(Delim::Switch) {
                    spec = SW;
                    self.advance()?;
                } else if self.t_delim(Delim::Procedure) {
                    spec = P;
                    self.advance()?;
                } else {
                    spec = ST;
                    self.advance()?;
                }
                loop {
                    if !self.t_is_ident() {
                        self.error("missing formal parameter identifier")?;
                        break;
                    }
                    if self.first() {
                        let name = self.t_image();
                        let ssn = self.t_line();
                        let id = self.look_up(&name, false, ssn)?;
                        if self.flags(id).is_empty() {
                            self.error(format!(
                                "identifier `{}' missing from formal parameter list",
                                name
                            ))?;
                        }
                        if self.flags(id).intersects(!(BN | BV)) {
                            self.error(format!(
                                "formal parameter `{}' multiply specified",
                                name
                            ))?;
                        }
                        // a specification counts as a declaration
                        {
                            let i = self.table.ident_mut(id);
                            i.ssn_decl = ssn;
                            i.ssn_used = 0;
                            i.flags |= spec;
                        }
                        if self.flags(id).contains(BV)
                            && self.flags(id).intersects(SW | P | ST)
                        {
                            self.error(format!(
                                "invalid call by value of switch, procedure, or string `{}'",
                                name
                            ))?;
                        }
                    }
                    self.advance()?;
                    if !self.t_delim(Delim::Comma) {
                        break;
                    }
                    self.advance()?;
                }
                if !self.t_delim(Delim::Semicolon) {
                    self.error("missing semicolon after specification")?;
                    self.skip_to_semicolon()?;
                }
                self.advance()?; // ;
            }
            // a frequent mistake
            if self.t_delim(Delim::Value) {
                self.error("specification part precedes value part")?;
                continue;
            }
            break;
        }
        // every formal parameter must be specified
        {
            let formals = self.table.block(self.table.cur()).idents.clone();
            let mut ok = true;
            for id in formals {
                if !self.flags(id).intersects(!(BN | BV)) {
                    let name = self.table.ident(id).name.clone();
                    self.error(format!("formal parameter `{}' not specified", name))?;
                    ok = false;
                }
            }
            if !ok {
                self.error(format!(
                    "specification part of procedure `{}' incomplete",
                    proc_name
                ))?;
            }
        }
        Ok(())
    }

    /// Emits the code evaluating by-value formal parameters and
    /// storing by-name descriptors into the DSA.
    fn copy_formal_parameters(&mut self, code: &mut Code) {
        let cur = self.table.cur();
        let cseq = self.table.block(cur).seqn;
        for id in self.table.block(cur).idents.clone() {
            let f = self.flags(id);
            let name = self.table.ident(id).name.clone();
            let decl = self.table.ident(id).ssn_decl;
            let arg = format!("{}_{}", name, cseq);
            if f == R | BV || f == I | BV || f == B | BV || f == L | BV {
                let get = if f.contains(R) {
                    "get_real"
                } else if f.contains(I) {
                    "get_int"
                } else if f.contains(B) {
                    "get_bool"
                } else {
                    "get_label"
                };
                code.append(format!("      my_dsa.line = {};\n", decl));
                code.append(format!(
                    "      my_dsa.{} = {}((global_dsa = {}.arg2, (*(struct desc \
                     (*)(void)){}.arg1)()));\n",
                    arg, get, arg, arg
                ));
            } else if f == R | A | BV || f == I | A | BV || f == B | A | BV {
                let copy = if f.contains(R) {
                    "copy_real"
                } else if f.contains(I) {
                    "copy_int"
                } else {
                    "copy_bool"
                };
                code.append(format!("      my_dsa.line = {};\n", decl));
                code.append(format!("      my_dsa.{} = {}({});\n", arg, copy, arg));
            } else if f == R | BN
                || f == I | BN
                || f == B | BN
                || f == L | BN
                || f == SW | BN
                || f == R | P | BN
                || f == I | P | BN
                || f == B | P | BN
                || f == P | BN
            {
                code.append(format!("      my_dsa.{} = {};\n", arg, arg));
            } else if f == R | A | BN || f == I | A | BN || f == B | A | BN || f == ST | BN {
                code.append(format!("      my_dsa.{} = {}.arg1;\n", arg, arg));
            } else {
                unreachable!("invalid formal parameter flags {:?}", f);
            }
        }
    }
}

/// Escapes the source file name for use in a C string literal,
/// keeping roughly the first hundred characters.
fn escape_filename(name: &str) -> String {
    let mut out = String::new();
    let mut k = 0;
    let mut rest = false;
    for c in name.chars() {
        if k >= 100 {
            rest = true;
            break;
        }
        if c == '\\' || c == '"' {
            out.push('\\');
            k += 1;
        }
        out.push(c);
        k += 1;
    }
    if rest {
        out.push_str("...");
    }
    out
}

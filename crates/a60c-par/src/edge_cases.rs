//! Whole-pipeline tests: both passes over small source programs,
//! with the interlude (prototypes and DSA structs) in between, the
//! way the driver runs them.

use a60c_gen::{emit_dsa_structs, emit_forward_decls};
use a60c_util::{Fatal, Handler};

use crate::Translator;

/// Runs a full translation and returns the emitted C text plus the
/// error/warning counts. Panics if the first pass fails.
fn translate(src: &str) -> (String, u32, u32) {
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    let is_main = tr.run_pass_one().expect("first pass");
    assert_eq!(
        tr.diag.error_count(),
        0,
        "unexpected errors on the first pass"
    );
    tr.prepare_pass_two();
    emit_forward_decls(&tr.table, &mut tr.emit);
    emit_dsa_structs(&mut tr.table, &mut tr.emit);
    tr.run_pass_two().expect("second pass");
    if is_main {
        tr.emit_startup_code();
    }
    (tr.emit.text(), tr.diag.error_count(), tr.diag.warning_count())
}

/// Runs only the first pass; returns the error count.
fn first_pass_errors(src: &str) -> u32 {
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    tr.run_pass_one().expect("first pass");
    tr.diag.error_count()
}

#[test]
fn test_outinteger_program() {
    let (c, errs, _) = translate("begin outinteger(1, 2+3) end\n");
    assert_eq!(errs, 0);
    assert!(c.contains("extern struct desc main_program_0 /* program */ (void);"));
    assert!(c.contains("extern struct desc outinteger_0 /* builtin void procedure */"));
    assert!(c.contains("struct dsa_main_program_0\n"));
    // the channel constant 1 shares a thunk; 2+3 gets its own
    assert!(c.contains("static struct desc _thunk_1(void)\n"));
    assert!(c.contains("res.u.int_val = 1;"));
    assert!(c.contains("res.u.int_val = 2 + 3;"));
    assert!(c.contains(
        "outinteger_0(make_arg((void *)_thunk_1, dsa_0), make_arg((void *)_thunk_2, dsa_0))"
    ));
    assert!(c.contains("int main(void)"));
    assert!(c.contains("main_program_0();"));
    assert!(c.ends_with("}\n\n"));
}

#[test]
fn test_simple_assignment_forms() {
    let src = "\
begin
   integer i; real x;
   i := 3;
   x := i / 2
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    // declarations land in block 3 of the main program
    assert!(c.contains("      dsa_0->i_3 = 3;\n"));
    // division always upconverts to real
    assert!(c.contains("dsa_0->x_3 = int2real(dsa_0->i_3) / int2real(2);"));
}

#[test]
fn test_integer_division_stays_integer() {
    let src = "begin integer i, j; i := 7; j := i % 2 end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("dsa_0->j_3 = dsa_0->i_3 / 2;"));
    assert!(!c.contains("int2real(dsa_0->i_3) / int2real(2)"));
}

#[test]
fn test_relations_use_macros() {
    let src = "begin integer i; i := 0; if i < 3 & ! (i = 2) then i := 1 end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("and(less(dsa_0->i_3, 3), not((equal(dsa_0->i_3, 2))))"));
    assert!(c.contains(")) goto _omega_1;\n"));
    assert!(c.contains("_omega_1:\n"));
}

#[test]
fn test_conditional_with_else() {
    let src = "begin integer i; i := 0; if i = 0 then i := 1 else i := 2 end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains(")) goto _gamma_1;\n"));
    assert!(c.contains("      goto _omega_1;\n_gamma_1:\n"));
    assert!(c.contains("_omega_1:\n"));
}

#[test]
fn test_recursive_factorial() {
    let src = "\
begin
   integer procedure f(n); value n; integer n;
   f := if n <= 1 then 1 else n * f(n - 1);
   outinteger(1, f(5))
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    // f is local to block 3; its formal block is 4
    assert!(c.contains("static struct desc f_3 /* local integer procedure */"));
    assert!(c.contains("struct dsa_f_3\n"));
    // by-value evaluation of n on entry
    assert!(c.contains(
        "my_dsa.n_4 = get_int((global_dsa = n_4.arg2, (*(struct desc (*)(void))n_4.arg1)()));"
    ));
    // assignment to the procedure identifier targets retval
    assert!(c.contains("dsa_1->retval.u.int_val = "));
    assert!(c.contains("notgreater(dsa_1->n_4, 1)"));
    // the recursive call goes through the same descriptor machinery
    assert!(c.contains("get_int((global_dsa = (void *)dsa_1, f_3("));
}

#[test]
fn test_jensens_device() {
    let src = "\
begin
   integer k; real y;
   real procedure sum(i, lo, hi, e); value lo, hi;
   integer i, lo, hi; real e;
   begin
      real s;
      s := 0;
      for i := lo step 1 until hi do s := s + e;
      sum := s
   end;
   y := sum(k, 1, 10, k*k)
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    // the by-name controlled variable reads and writes through the
    // descriptor
    assert!(c.contains("set_int((global_dsa = dsa_1->i_4.arg2"));
    assert!(c.contains("get_real((global_dsa = dsa_1->e_4.arg2"));
    // the statement after `do' is extruded
    assert!(c.contains("static void _sigma_1(void)\n"));
    assert!(c.contains("global_dsa = (void *)dsa_1, _sigma_1();"));
    // k and k*k become thunks in the caller's environment
    assert!(c.contains("res.u.int_ptr = &(dsa_0->k_3);"));
    assert!(c.contains("res.u.int_val = dsa_0->k_3 * dsa_0->k_3;"));
}

#[test]
fn test_for_step_until_shape() {
    let src = "begin integer i, s; s := 0; for i := 1 step 1 until 50 do s := s + i end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("dsa_0->teta_i_3 = 1;"));
    assert!(c.contains("_gamma_1:\n"));
    assert!(c.contains(
        "if ((dsa_0->i_3 - (50)) * (dsa_0->teta_i_3 < 0 ? -1 : dsa_0->teta_i_3 > 0 ? +1 : 0) > 0) \
         goto _omega_1;"
    ));
    assert!(c.contains("dsa_0->i_3 = dsa_0->teta_i_3 + dsa_0->i_3;"));
    assert!(c.contains("_omega_1: /* element exhausted */\n"));
    assert!(c.contains("static void _sigma_1(void)\n"));
}

#[test]
fn test_for_while_shape() {
    let src = "begin integer i; for i := i + 1 while i < 5 do i := i end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("_gamma_1:\n"));
    assert!(c.contains("if (!(less(dsa_0->i_3, 5))) goto _omega_1;"));
    assert!(c.contains("goto _gamma_1;"));
}

#[test]
fn test_own_variable_is_static() {
    let src = "\
begin
   procedure p;
   begin
      own integer count;
      count := count + 1
   end;
   p; p
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("static int count_6 = 0;\n"));
    assert!(c.contains("count_6 = count_6 + 1;"));
    // own variables occupy no DSA slot
    assert!(!c.contains("int count_6;\n"));
}

#[test]
fn test_array_declaration_and_subscripts() {
    let src = "\
begin
   integer n;
   n := 10;
   begin
      real array a[1:n, 0:5];
      a[1, 0] := 2.5
   end
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("dsa_0->a_4 = alloc_array('r', 2, 1, dsa_0->n_3, 0, 5);"));
    assert!(c.contains("(*loc_real(dsa_0->a_4, 2, 1, 0)) = 2.5;"));
    assert!(c.contains("struct dv *a_4;"));
}

#[test]
fn test_own_array_guarded() {
    let src = "begin procedure p; begin own integer array b[1:8]; b[1] := 0 end; p end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("static struct dv *b_6 = NULL;\n"));
    assert!(c.contains("if (b_6 == NULL) b_6 = own_array('i', 1, 1, 8);"));
}

#[test]
fn test_goto_and_labels() {
    let src = "\
begin
   integer i;
   i := 0;
   begin
      integer j;
      j := 1;
      go to done
   end;
done:
   outinteger(1, i)
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    // the label's block dispatches non-local transfers
    assert!(c.contains("switch (setjmp(&dsa_0->jump_2[0]))"));
    assert!(c.contains(
        "case 1: pop_stack(dsa_0->new_top_2); active_dsa = (struct dsa *)dsa_0; goto done_3;"
    ));
    assert!(c.contains("go_to(make_label(dsa_0->jump_2, 1));"));
    assert!(c.contains("done_3:\n"));
}

#[test]
fn test_direct_goto_same_block() {
    let src = "begin integer i; i := 0; again: i := i + 1; go to again end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("again_3:\n"));
    assert!(c.contains("      goto again_3;\n"));
    // the jump is direct, not through the runtime
    assert!(!c.contains("go_to("));
}

#[test]
fn test_switch_declaration_and_designator() {
    let src = "\
begin
   integer i;
   switch s := l1, l2;
   i := 1;
   go to s[i];
l1: i := 1;
l2: i := 2
end
";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("static struct label s_3 /* local switch */ (int);"));
    assert!(c.contains("static struct label s_3(int kase)\n"));
    assert!(c.contains("case 1: dsa_0->line = "));
    assert!(c.contains("default: fault(\"switch designator undefined\");"));
    assert!(c.contains("return make_label(NULL, 0);"));
    assert!(c.contains("go_to((global_dsa = (void *)dsa_0, s_3(dsa_0->i_3)));"));
}

#[test]
fn test_string_actual_parameter() {
    let src = "begin outstring(1, \"hello\") end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("make_arg(\"hello\", NULL)"));
}

#[test]
fn test_exponentiation_forms() {
    let src = "begin integer i; real x; i := 2 ^ 3; x := x ^ i; x := x ^ x end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("expi(2, 3)"));
    assert!(c.contains("expn(dsa_0->x_3, dsa_0->i_3)"));
    assert!(c.contains("expr(dsa_0->x_3, dsa_0->x_3)"));
}

#[test]
fn test_conditional_expression_upconversion() {
    let src = "begin real x; integer i; i := 1; x := if i = 1 then 1 else 2.5 end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("((equal(dsa_0->i_3, 1)) ? (int2real(1)) : (2.5))"));
}

#[test]
fn test_leading_ten_real_constant() {
    let src = "begin real x; x := #5 end\n";
    let (c, errs, _) = translate(src);
    assert_eq!(errs, 0);
    assert!(c.contains("dsa_0->x_3 = 1e5;"));
}

#[test]
fn test_translation_is_deterministic() {
    let src = "begin integer i; for i := 1 step 1 until 9 do outinteger(1, i) end\n";
    let (a, _, _) = translate(src);
    let (b, _, _) = translate(src);
    assert_eq!(a, b);
}

// ==================== error reporting ====================

#[test]
fn test_undeclared_identifier_reported() {
    assert_eq!(first_pass_errors("begin x := 1 end\n"), 1);
}

#[test]
fn test_builtins_are_not_undeclared() {
    assert_eq!(
        first_pass_errors("begin outreal(1, sqrt(2.0)) end\n"),
        0
    );
}

#[test]
fn test_multiply_declared_reported() {
    assert_eq!(
        first_pass_errors("begin integer i; real i; i := 1 end\n"),
        1
    );
}

#[test]
fn test_mixed_assignment_chain_rejected() {
    let src = "begin integer i; real x; i := x := 1.5 end\n";
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    tr.run_pass_one().expect("first pass");
    assert_eq!(tr.diag.error_count(), 0);
    tr.prepare_pass_two();
    emit_forward_decls(&tr.table, &mut tr.emit);
    emit_dsa_structs(&mut tr.table, &mut tr.emit);
    tr.run_pass_two().expect("second pass");
    assert!(tr.diag.error_count() > 0);
}

#[test]
fn test_else_after_for_rejected() {
    let src = "begin integer i; if i = 0 then for i := 1 step 1 until 2 do i := i else i := 3 end\n";
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    tr.run_pass_one().expect("first pass");
    assert!(tr.diag.error_count() > 0);
}

#[test]
fn test_own_array_bound_must_be_literal() {
    assert!(first_pass_errors("begin integer n; own array a[1:n]; n := 1 end\n") > 0);
}

#[test]
fn test_bound_referencing_same_block_rejected() {
    // Modified Report 5.2.4.2: a bound expression may not use an
    // identifier declared in the same block head
    let src = "begin integer n; integer array a[1:n]; n := 1; a[1] := n end\n";
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    tr.run_pass_one().expect("first pass");
    assert_eq!(tr.diag.error_count(), 0);
    tr.prepare_pass_two();
    emit_forward_decls(&tr.table, &mut tr.emit);
    emit_dsa_structs(&mut tr.table, &mut tr.emit);
    tr.run_pass_two().expect("second pass");
    assert!(tr.diag.error_count() > 0);
}

#[test]
fn test_empty_for_list_is_error() {
    assert!(first_pass_errors("begin integer i; for i := do i := 1 end\n") > 0);
}

#[test]
fn test_unspecified_formal_reported() {
    let src = "begin procedure p(a); value a; begin integer q; q := 1 end; p(1) end\n";
    assert!(first_pass_errors(src) > 0);
}

#[test]
fn test_invalid_call_by_value_of_string() {
    let src = "begin procedure p(a); value a; string a; outstring(1, a); p(\"x\") end\n";
    assert!(first_pass_errors(src) > 0);
}

#[test]
fn test_null_program_rejected() {
    assert!(first_pass_errors("") > 0);
}

#[test]
fn test_error_ceiling_aborts() {
    // every statement references a fresh undeclared identifier, so
    // the resolver raises more errors than the ceiling allows
    let src = "begin a := b := c := d := e := f := g := h := 1 end\n";
    let diag = Handler::new("test.alg", 3, true, false);
    let mut tr = Translator::new(src, diag);
    assert_eq!(tr.run_pass_one(), Err(Fatal));
}

#[test]
fn test_wrong_arity_reported() {
    let src = "begin outinteger(1) end\n";
    let diag = Handler::new("test.alg", 0, true, false);
    let mut tr = Translator::new(src, diag);
    tr.run_pass_one().expect("first pass");
    assert_eq!(tr.diag.error_count(), 0);
    tr.prepare_pass_two();
    emit_forward_decls(&tr.table, &mut tr.emit);
    emit_dsa_structs(&mut tr.table, &mut tr.emit);
    tr.run_pass_two().expect("second pass");
    assert!(tr.diag.error_count() > 0);
}

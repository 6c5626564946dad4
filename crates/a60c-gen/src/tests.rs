//! Tests for heading, forward-declaration, and DSA emission.

use a60c_util::Handler;

use a60c_sym::{IdentFlags, IdentId, SymbolTable};

use crate::code::Code;
use crate::dsa::{emit_dsa_structs, emit_forward_decls, emit_proc_head};

fn handler() -> Handler {
    Handler::new("t.alg", 0, true, false)
}

/// Builds: env { proc main_program { body { x: real, lab: label } } }
fn sample_table() -> (SymbolTable, IdentId) {
    let mut t = SymbolTable::new();
    let mut d = handler();
    t.enter_block(None, 0);
    let main = t.look_up("main_program", true, 1, false, &mut d).unwrap();
    t.ident_mut(main).flags = IdentFlags::PROC;
    t.ident_mut(main).dim = 0;
    t.enter_block(Some(main), 1);
    t.enter_block(None, 1);
    let x = t.look_up("x", true, 2, false, &mut d).unwrap();
    t.ident_mut(x).flags = IdentFlags::REAL;
    t.ident_mut(x).ssn_used = 3;
    let lab = t.look_up("lab", true, 4, false, &mut d).unwrap();
    t.ident_mut(lab).flags = IdentFlags::LABEL;
    t.ident_mut(lab).ssn_used = 5;
    t.leave_block();
    t.leave_block();
    t.leave_block();
    (t, main)
}

#[test]
fn test_main_program_heading() {
    let (t, main) = sample_table();
    let mut emit = Code::new(true);
    emit_proc_head(&t, main, false, &mut emit);
    assert_eq!(emit.text(), "struct desc main_program_0 /* program */ (void)\n");
}

#[test]
fn test_main_program_prototype_extern() {
    let (t, main) = sample_table();
    let mut emit = Code::new(true);
    emit_proc_head(&t, main, true, &mut emit);
    let text = emit.text();
    assert!(text.starts_with("extern struct desc main_program_0"));
    assert!(text.ends_with(";\n\n"));
}

#[test]
fn test_forward_decls_cover_procs() {
    let (t, _) = sample_table();
    let mut emit = Code::new(true);
    emit_forward_decls(&t, &mut emit);
    assert!(emit.text().contains("main_program_0"));
}

#[test]
fn test_dsa_struct_fields() {
    let (mut t, _) = sample_table();
    let mut emit = Code::new(true);
    emit_dsa_structs(&mut t, &mut emit);
    let text = emit.text();
    assert!(text.contains("struct dsa_main_program_0\n"));
    assert!(text.contains("/* procedure main_program (level 0) declared at line 1 */"));
    assert!(text.contains("      struct dsa *vector[0+1];\n"));
    assert!(text.contains("      struct mem *old_top_0;\n"));
    assert!(text.contains("      struct mem *new_top_1;\n"));
    // the body block (level 1) owns a referenced label
    assert!(text.contains("      jmp_buf jump_1;\n"));
    assert!(!text.contains("jmp_buf jump_0;"));
    // x is localized in block 2
    assert!(text.contains("      double x_2;\n"));
    assert!(text.contains("      struct desc retval;\n"));
    // labels occupy no field but receive a case ordinal
    assert!(!text.contains("lab_2;"));
}

#[test]
fn test_label_ordinal_assigned() {
    let (mut t, _) = sample_table();
    let mut emit = Code::new(true);
    emit_dsa_structs(&mut t, &mut emit);
    let lab = t.find_in_block(a60c_sym::BlockId(2), "lab").unwrap();
    assert_eq!(t.ident(lab).dim, 1);
}

#[test]
fn test_formal_heading_and_prototype() {
    let mut t = SymbolTable::new();
    let mut d = handler();
    t.enter_block(None, 0);
    let f = t.look_up("f", true, 1, false, &mut d).unwrap();
    t.ident_mut(f).flags = IdentFlags::INT | IdentFlags::PROC;
    t.ident_mut(f).dim = 2;
    t.enter_block(Some(f), 1);
    let n = t.look_up("n", true, 1, false, &mut d).unwrap();
    t.ident_mut(n).flags = IdentFlags::INT | IdentFlags::BYVAL;
    let e = t.look_up("e", true, 1, false, &mut d).unwrap();
    t.ident_mut(e).flags = IdentFlags::REAL | IdentFlags::BYNAME;
    t.leave_block();
    t.leave_block();

    let mut emit = Code::new(true);
    emit_proc_head(&t, f, false, &mut emit);
    let text = emit.text();
    assert!(text.contains("struct desc f_0 /* precompiled integer procedure */\n"));
    assert!(text.contains("(     struct arg n_1 /* by value integer */,\n"));
    assert!(text.contains("      struct arg e_1 /* by name real */\n)"));

    let mut proto = Code::new(true);
    emit_proc_head(&t, f, true, &mut proto);
    let text = proto.text();
    assert!(text.contains("/* n: by value integer */"));
    assert!(text.ends_with(";\n\n"));
}

#[test]
fn test_own_and_array_fields() {
    let mut t = SymbolTable::new();
    let mut d = handler();
    t.enter_block(None, 0);
    let p = t.look_up("p", true, 1, false, &mut d).unwrap();
    t.ident_mut(p).flags = IdentFlags::PROC;
    t.ident_mut(p).dim = 0;
    t.enter_block(Some(p), 1);
    t.enter_block(None, 1);
    let a = t.look_up("a", true, 2, false, &mut d).unwrap();
    t.ident_mut(a).flags = IdentFlags::REAL | IdentFlags::ARRAY;
    let c = t.look_up("count", true, 3, false, &mut d).unwrap();
    t.ident_mut(c).flags = IdentFlags::INT | IdentFlags::OWN;
    t.leave_block();
    t.leave_block();
    t.leave_block();

    let mut emit = Code::new(true);
    emit_dsa_structs(&mut t, &mut emit);
    let text = emit.text();
    assert!(text.contains("      struct dv *a_2;\n"));
    // own variables live in static storage, not the DSA
    assert!(!text.contains("count_2;"));
}

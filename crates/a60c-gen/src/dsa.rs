//! Emission of procedure headings, forward declarations, and the
//! per-procedure DSA structs.
//!
//! Every translated procedure receives a dynamic storage area struct
//! `dsa_<proc>_<seq>` holding the standard header (procedure name,
//! source file, current line, parent pointer, display vector),
//! per-block-level stack-top save slots, a `jmp_buf` per level that
//! owns referenced labels, the returned-value slot, and one field per
//! identifier localized in any block of the procedure. Identifier
//! `foo` localized in block `n` becomes field `foo_n`.

use a60c_sym::{BlockId, Ident, IdentFlags, IdentId, SymbolTable};

use crate::code::Code;

const R: IdentFlags = IdentFlags::REAL;
const I: IdentFlags = IdentFlags::INT;
const B: IdentFlags = IdentFlags::BOOL;
const L: IdentFlags = IdentFlags::LABEL;
const A: IdentFlags = IdentFlags::ARRAY;
const P: IdentFlags = IdentFlags::PROC;
const SW: IdentFlags = IdentFlags::SWITCH;
const ST: IdentFlags = IdentFlags::STRING;
const BV: IdentFlags = IdentFlags::BYVAL;
const BN: IdentFlags = IdentFlags::BYNAME;
const OW: IdentFlags = IdentFlags::OWN;

/// Emits the heading of a translated procedure, or its prototype
/// when `proto` is set. Pseudo-procedures need no output code.
pub fn emit_proc_head(table: &SymbolTable, proc: IdentId, proto: bool, emit: &mut Code) {
    let p = table.ident(proc);
    if p.flags.contains(IdentFlags::BLTIN) && (p.name == "inline" || p.name == "print") {
        return;
    }
    let fblock = table
        .proc_block_of(proc)
        .expect("every procedure has its formal block");
    let pseq = table.block(p.block).seqn;
    if proto {
        // procedures of the environmental block may be called from
        // other modules
        if p.block == BlockId::ENV {
            emit.append("extern ");
        } else {
            emit.append("static ");
        }
    }
    emit.append(format!("struct desc {}_{}", p.name, pseq));
    if p.name == "main_program" {
        emit.append(" /* program */");
    } else {
        let kind = if p.flags.contains(IdentFlags::CODE) {
            "code"
        } else if p.flags.contains(IdentFlags::BLTIN) {
            "builtin"
        } else if p.block == BlockId::ENV {
            "precompiled"
        } else {
            "local"
        };
        let ty = if p.flags.contains(R) {
            "real"
        } else if p.flags.contains(I) {
            "integer"
        } else if p.flags.contains(B) {
            "Boolean"
        } else {
            "void"
        };
        emit.append(format!(" /* {} {} procedure */", kind, ty));
    }
    if p.dim == 0 {
        emit.append(" (void)");
    } else {
        emit.append("\n");
        let formals = table.block(fblock).idents.clone();
        let fseq = table.block(fblock).seqn;
        for (k, &id) in formals.iter().enumerate() {
            let f = table.ident(id);
            emit.append(format!("{}     struct arg ", if k == 0 { "(" } else { " " }));
            if proto {
                emit.append(format!("/* {}:", f.name));
            } else {
                emit.append(format!("{}_{} /*", f.name, fseq));
            }
            emit.append(f.flags.describe());
            emit.append(format!(
                " */{}",
                if k + 1 == formals.len() { "\n)" } else { ",\n" }
            ));
        }
    }
    emit.append(if proto { ";\n\n" } else { "\n" });
}

/// Emits prototypes for all translated procedures and forward
/// declarations for all local switches; both may be referenced
/// before their declarations appear.
pub fn emit_forward_decls(table: &SymbolTable, emit: &mut Code) {
    for b in table.all_blocks() {
        if let Some(proc) = table.block(b).proc {
            emit_proc_head(table, proc, true, emit);
        }
        for &id in &table.block(b).idents {
            let i = table.ident(id);
            if i.flags == SW {
                emit.append(format!(
                    "static struct label {}_{} /* local switch */ (int);\n\n",
                    i.name,
                    table.block(i.block).seqn
                ));
            }
        }
    }
}

/// Emits the DSA struct field for one identifier, when it has one.
///
/// Own objects are file-scope statics, and labels, switches, and
/// local procedures are jump targets or functions, so none of those
/// occupy a DSA slot.
fn emit_decl_code(id: &Ident, seqn: u32, emit: &mut Code) {
    let f = id.flags;
    if f == R || f == R | BV {
        emit.append(format!("      double {}_{};\n", id.name, seqn));
    } else if f == I || f == I | BV {
        emit.append(format!("      int {}_{};\n", id.name, seqn));
    } else if f == B || f == B | BV {
        emit.append(format!("      bool {}_{};\n", id.name, seqn));
    } else if f == L | BV {
        emit.append(format!("      struct label {}_{};\n", id.name, seqn));
    } else if f.contains(A) && !f.contains(OW) {
        emit.append(format!("      struct dv *{}_{};\n", id.name, seqn));
    } else if f == ST | BN {
        emit.append(format!("      char *{}_{};\n", id.name, seqn));
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
        emit.append(format!("      struct arg {}_{};\n", id.name, seqn));
    } else if f.contains(OW)
        || f == L
        || f == SW
        || f == R | P
        || f == I | P
        || f == B | P
        || f == P
    {
        // no DSA field
    } else {
        unreachable!("invalid identifier flags {:?} in DSA emission", f);
    }
}

/// Emits the DSA struct of every translated procedure, assigning
/// label case ordinals (used by the non-local go-to dispatch) along
/// the way.
pub fn emit_dsa_structs(table: &mut SymbolTable, emit: &mut Code) {
    for block in table.all_blocks().collect::<Vec<_>>() {
        let proc = match table.block(block).proc {
            Some(p) => p,
            None => continue,
        };
        if table
            .ident(proc)
            .flags
            .intersects(IdentFlags::CODE | IdentFlags::BLTIN)
        {
            continue;
        }
        let pname = table.ident(proc).name.clone();
        let pseq = table.block(table.ident(proc).block).seqn;
        let plevel = table.dsa_level(proc) + 1;
        emit.append(format!("struct dsa_{}_{}\n", pname, pseq));
        emit.append(format!(
            "{{     /* procedure {} (level {}) declared at line {} */\n",
            pname,
            plevel,
            table.ident(proc).ssn_decl
        ));
        emit.append("      char *proc;\n");
        emit.append("      char *file;\n");
        emit.append("      int line;\n");
        emit.append("      struct dsa *parent;\n");
        emit.append(format!("      struct dsa *vector[{}+1];\n", plevel));
        // per-level bookkeeping slots
        let owned: Vec<BlockId> = table
            .all_blocks()
            .filter(|&b| table.proc_block(b) == Some(block))
            .collect();
        let maxlev = owned
            .iter()
            .map(|&b| table.block_level(b))
            .max()
            .unwrap_or(0);
        emit.append(format!(
            "      /* level of innermost block = {} */\n",
            maxlev
        ));
        for k in 0..=maxlev {
            emit.append(format!("      struct mem *old_top_{};\n", k));
            emit.append(format!("      struct mem *new_top_{};\n", k));
            let need = owned
                .iter()
                .any(|&b| table.block_level(b) == k && table.has_labels(b));
            if need {
                emit.append(format!("      jmp_buf jump_{};\n", k));
            }
        }
        // one field per identifier localized in any block of the
        // procedure
        for b in owned {
            emit.append(format!(
                "      /* {} block {} (level {}) beginning at line {} */\n",
                if table.block(b).proc.is_some() {
                    "procedure"
                } else {
                    "local"
                },
                table.block(b).seqn,
                table.block_level(b),
                table.block(b).ssn
            ));
            if table.block(b).proc.is_some() {
                assert_eq!(table.block(b).proc, Some(proc));
                emit.append("      struct desc retval;\n");
            }
            let mut count = 0;
            let seqn = table.block(b).seqn;
            for id in table.block(b).idents.clone() {
                {
                    let i = table.ident(id);
                    assert!(!i.flags.intersects(IdentFlags::CODE | IdentFlags::BLTIN));
                    emit.append(format!("      /* {}:{}", i.name, i.flags.describe()));
                    emit.append(format!(
                        "\n         {} at line {} and ",
                        if i.flags.intersects(BV | BN) {
                            "specified"
                        } else {
                            "declared"
                        },
                        i.ssn_decl
                    ));
                }
                if table.ident(id).ssn_used == 0 {
                    emit.append("never referenced */\n");
                } else {
                    emit.append(format!(
                        "first referenced at line {} */\n",
                        table.ident(id).ssn_used
                    ));
                    if table.ident(id).flags == L {
                        count += 1;
                        table.ident_mut(id).dim = count;
                    }
                }
                emit_decl_code(table.ident(id), seqn, emit);
            }
        }
        emit.append("};\n\n");
    }
}

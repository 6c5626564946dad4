//! Builtin resolution at the end of the first pass.
//!
//! Every identifier left undeclared in the environmental block is
//! tested against the builtin catalog. On a match a procedure block
//! and its formal parameters are synthesized, so from then on the
//! identifier looks like a precompiled procedure declaration; the
//! runtime library provides the matching `<name>_0` entry point. An
//! identifier matching nothing is reported undeclared.

use indexmap::IndexMap;

use a60c_util::{Handler, Outcome};

use crate::flags::IdentFlags;
use crate::table::{BlockId, SymbolTable};

const RP: IdentFlags = IdentFlags::REAL.union(IdentFlags::PROC).union(IdentFlags::BLTIN);
const IP: IdentFlags = IdentFlags::INT.union(IdentFlags::PROC).union(IdentFlags::BLTIN);
const VP: IdentFlags = IdentFlags::PROC.union(IdentFlags::BLTIN);

const RV: IdentFlags = IdentFlags::REAL.union(IdentFlags::BYVAL);
const IV: IdentFlags = IdentFlags::INT.union(IdentFlags::BYVAL);
const IN: IdentFlags = IdentFlags::INT.union(IdentFlags::BYNAME);
const RN: IdentFlags = IdentFlags::REAL.union(IdentFlags::BYNAME);
const SN: IdentFlags = IdentFlags::STRING.union(IdentFlags::BYNAME);

/// One builtin procedure signature.
struct Builtin {
    flags: IdentFlags,
    dim: i32,
    formals: &'static [(&'static str, IdentFlags)],
    /// Pseudo-procedures are expanded specially by the translator and
    /// warn on use.
    pseudo: bool,
}

const fn plain(
    flags: IdentFlags,
    dim: i32,
    formals: &'static [(&'static str, IdentFlags)],
) -> Builtin {
    Builtin {
        flags,
        dim,
        formals,
        pseudo: false,
    }
}

/// The builtin catalog. This table is the contract between the
/// translator and the runtime library; keep the two in lockstep.
const CATALOG: &[(&str, Builtin)] = &[
    ("abs", plain(RP, 1, &[("E", RV)])),
    ("iabs", plain(IP, 1, &[("E", IV)])),
    ("sign", plain(IP, 1, &[("E", RV)])),
    ("entier", plain(IP, 1, &[("E", RV)])),
    ("sqrt", plain(RP, 1, &[("E", RV)])),
    ("sin", plain(RP, 1, &[("E", RV)])),
    ("cos", plain(RP, 1, &[("E", RV)])),
    ("arctan", plain(RP, 1, &[("E", RV)])),
    ("ln", plain(RP, 1, &[("E", RV)])),
    ("exp", plain(RP, 1, &[("E", RV)])),
    ("stop", plain(VP, 0, &[])),
    ("fault", plain(VP, 2, &[("str", SN), ("r", RV)])),
    ("inchar", plain(VP, 3, &[("channel", IV), ("str", SN), ("int", IN)])),
    ("outchar", plain(VP, 3, &[("channel", IV), ("str", SN), ("int", IV)])),
    ("length", plain(IP, 1, &[("str", SN)])),
    ("outstring", plain(VP, 2, &[("channel", IV), ("str", SN)])),
    ("outterminator", plain(VP, 1, &[("channel", IV)])),
    ("ininteger", plain(VP, 2, &[("channel", IV), ("int", IN)])),
    ("outinteger", plain(VP, 2, &[("channel", IV), ("int", IV)])),
    ("inreal", plain(VP, 2, &[("channel", IV), ("re", RN)])),
    ("outreal", plain(VP, 2, &[("channel", IV), ("re", RV)])),
    ("maxreal", plain(RP, 0, &[])),
    ("minreal", plain(RP, 0, &[])),
    ("maxint", plain(IP, 0, &[])),
    ("epsilon", plain(RP, 0, &[])),
    (
        "inline",
        Builtin {
            flags: VP,
            dim: 1,
            formals: &[("statement", SN)],
            pseudo: true,
        },
    ),
    (
        "print",
        Builtin {
            flags: VP,
            dim: 0, // variadic; arity is not checked
            formals: &[],
            pseudo: true,
        },
    ),
];

/// Resolves all identifiers left undeclared in the environmental
/// block, binding builtins and reporting the rest.
pub fn resolve(table: &mut SymbolTable, diag: &mut Handler) -> Outcome<()> {
    let catalog: IndexMap<&'static str, &Builtin> =
        CATALOG.iter().map(|(n, b)| (*n, b)).collect();
    let ids = table.block(BlockId::ENV).idents.clone();
    for id in ids {
        if !table.ident(id).flags.is_empty() {
            continue; // declared
        }
        let name = table.ident(id).name.clone();
        match catalog.get(name.as_str()) {
            Some(b) => {
                {
                    let i = table.ident_mut(id);
                    i.ssn_decl = 0;
                    i.flags = b.flags;
                    i.dim = b.dim;
                }
                table.enter_block(Some(id), 1);
                for &(fname, fflags) in b.formals {
                    let f = table.look_up(fname, false, 0, false, diag)?;
                    let fi = table.ident_mut(f);
                    fi.ssn_decl = 1;
                    fi.ssn_used = 1;
                    fi.flags = fflags;
                }
                table.leave_block();
                if b.pseudo {
                    diag.warning(format!("pseudo procedure `{}' used", name));
                }
            }
            None => {
                let used = table.ident(id).ssn_used;
                diag.error(format!(
                    "identifier `{}' not declared (see line {})",
                    name, used
                ))?;
            }
        }
    }
    Ok(())
}

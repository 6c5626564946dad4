//! The block tree and identifier arena.
//!
//! Blocks and identifiers live in arenas addressed by typed indices;
//! a block's sequential number is its arena index, which is also the
//! suffix that makes emitted C names unique. The table is built on
//! the first pass and walked in lockstep on the second.

use a60c_util::{Handler, Outcome, Pass};

use crate::flags::IdentFlags;

/// Index of a block in the block arena; doubles as the block's
/// sequential number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The environmental dummy block enclosing the whole module.
    pub const ENV: BlockId = BlockId(0);
}

/// Index of an identifier in the identifier arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdentId(pub u32);

impl IdentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One program block: an explicit `begin ... end` with declarations,
/// or a dummy block representing a procedure, a procedure body, or
/// the statement following `do`.
#[derive(Debug)]
pub struct Block {
    /// Sequential number (equals the arena index).
    pub seqn: u32,
    /// Source line where the block opens.
    pub ssn: u32,
    /// The procedure identifier, when this is a procedure block.
    pub proc: Option<IdentId>,
    /// Identifiers localized in this block, in declaration order.
    pub idents: Vec<IdentId>,
    /// Enclosing block.
    pub surr: Option<BlockId>,
}

/// One identifier of the source program.
#[derive(Debug)]
pub struct Ident {
    pub name: String,
    /// Line of the declaration or specification (0 = none yet).
    pub ssn_decl: u32,
    /// Line of the first reference (0 = never referenced).
    pub ssn_used: u32,
    /// Properties; empty while the identifier is undeclared.
    pub flags: IdentFlags,
    /// Dimension: subscript count for arrays, formal count for
    /// procedures, longjmp case ordinal for labels; -1 = unknown.
    pub dim: i32,
    /// Block in which the identifier is localized.
    pub block: BlockId,
}

/// The block tree plus the identifier arena and the current-block
/// cursor shared by both passes.
pub struct SymbolTable {
    blocks: Vec<Block>,
    idents: Vec<Ident>,
    current: Option<BlockId>,
    /// The last block reached by the pass-2 lockstep walk.
    cursor: Option<BlockId>,
    pass: Pass,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            idents: Vec::new(),
            current: None,
            cursor: None,
            pass: Pass::First,
        }
    }

    /// Switches the table to the given pass and rewinds the lockstep
    /// cursor.
    pub fn set_pass(&mut self, pass: Pass) {
        self.pass = pass;
        self.cursor = None;
    }

    #[inline]
    pub fn pass(&self) -> Pass {
        self.pass
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    #[inline]
    pub fn ident(&self, id: IdentId) -> &Ident {
        &self.idents[id.index()]
    }

    #[inline]
    pub fn ident_mut(&mut self, id: IdentId) -> &mut Ident {
        &mut self.idents[id.index()]
    }

    #[inline]
    pub fn current(&self) -> Option<BlockId> {
        self.current
    }

    /// The current block; panics outside any block (a translator
    /// invariant, not a source-program condition).
    #[inline]
    pub fn cur(&self) -> BlockId {
        self.current.expect("inside a block")
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// All blocks in sequential-number order.
    pub fn all_blocks(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    /// Enters a block. On the first pass a fresh block is created and
    /// linked under the current one; on the second pass the lockstep
    /// cursor advances to the next pass-1 block.
    pub fn enter_block(&mut self, proc: Option<IdentId>, ssn: u32) -> BlockId {
        match self.pass {
            Pass::First => {
                let id = BlockId(self.blocks.len() as u32);
                self.blocks.push(Block {
                    seqn: id.0,
                    ssn,
                    proc,
                    idents: Vec::new(),
                    surr: self.current,
                });
                self.current = Some(id);
                id
            }
            Pass::Second => {
                let next = match self.cursor {
                    None => BlockId(0),
                    Some(c) => BlockId(c.0 + 1),
                };
                assert!(next.index() < self.blocks.len(), "pass-2 block walk in step");
                self.cursor = Some(next);
                self.current = Some(next);
                next
            }
        }
    }

    /// Leaves the current block. On the first pass every identifier
    /// still undeclared (empty flags) is moved into the enclosing
    /// block; in the environmental block they stay for the resolver.
    pub fn leave_block(&mut self) {
        let old = self.cur();
        let surr = self.block(old).surr;
        self.current = surr;
        if self.pass.is_first() {
            if let Some(new_cur) = surr {
                let all = std::mem::take(&mut self.block_mut(old).idents);
                let (migrated, kept): (Vec<_>, Vec<_>) = all
                    .into_iter()
                    .partition(|&i| self.ident(i).flags.is_empty());
                self.block_mut(old).idents = kept;
                for id in migrated {
                    let (name, ssn_used, dim) = {
                        let i = self.ident(id);
                        (i.name.clone(), i.ssn_used, i.dim)
                    };
                    let target = match self.find_in_block(new_cur, &name) {
                        Some(t) => t,
                        None => self.add_ident(new_cur, &name),
                    };
                    let t = self.ident_mut(target);
                    if t.ssn_used == 0 {
                        t.ssn_used = ssn_used;
                    }
                    if t.dim < 0 {
                        t.dim = dim;
                    }
                }
            }
        }
    }

    fn add_ident(&mut self, block: BlockId, name: &str) -> IdentId {
        let id = IdentId(self.idents.len() as u32);
        self.idents.push(Ident {
            name: name.to_string(),
            ssn_decl: 0,
            ssn_used: 0,
            flags: IdentFlags::empty(),
            dim: -1,
            block,
        });
        self.block_mut(block).idents.push(id);
        id
    }

    /// Finds an identifier by name in one block (first match wins).
    pub fn find_in_block(&self, block: BlockId, name: &str) -> Option<IdentId> {
        self.block(block)
            .idents
            .iter()
            .copied()
            .find(|&i| self.ident(i).name == name)
    }

    /// Searches for an identifier by name.
    ///
    /// On the first pass only the current block is searched and the
    /// identifier is created when absent (declarations need not
    /// precede uses in ALGOL 60); declaring a name already declared
    /// in the same block is an error. On the second pass the search
    /// walks outwards and must succeed; when `bound_ctx` is set a hit
    /// localized in the current block violates Modified Report
    /// 5.2.4.2 and is reported.
    pub fn look_up(
        &mut self,
        name: &str,
        decl: bool,
        ssn: u32,
        bound_ctx: bool,
        diag: &mut Handler,
    ) -> Outcome<IdentId> {
        let cur = self.cur();
        match self.pass {
            Pass::First => {
                let mut found = self.find_in_block(cur, name);
                if decl {
                    if let Some(id) = found {
                        if !self.ident(id).flags.is_empty() {
                            diag.error(format!(
                                "identifier `{}' multiply declared (see line {})",
                                name,
                                self.ident(id).ssn_decl
                            ))?;
                            found = None; // as if it were not found
                        }
                    }
                }
                let id = match found {
                    Some(id) => id,
                    None => self.add_ident(cur, name),
                };
                if decl {
                    self.ident_mut(id).ssn_decl = ssn;
                } else if self.ident(id).ssn_used == 0 {
                    self.ident_mut(id).ssn_used = ssn;
                }
                Ok(id)
            }
            Pass::Second => {
                let mut b = cur;
                let id = loop {
                    if let Some(i) = self.find_in_block(b, name) {
                        break i;
                    }
                    b = self
                        .block(b)
                        .surr
                        .expect("identifier resolved on the first pass");
                };
                if bound_ctx && !decl && self.ident(id).block == cur {
                    diag.error(format!(
                        "identifier `{}' in bound expression declared in same program block as \
                         array",
                        name
                    ))?;
                }
                Ok(id)
            }
        }
    }

    /// DSA level of the procedure owning the identifier's block.
    ///
    /// The outermost procedures (precompiled procedures and the main
    /// program) have level 0.
    pub fn dsa_level(&self, id: IdentId) -> i32 {
        let mut level = -1;
        let mut b = Some(self.ident(id).block);
        while let Some(bid) = b {
            if self.block(bid).proc.is_some() {
                level += 1;
            }
            b = self.block(bid).surr;
        }
        level
    }

    /// DSA level of the procedure enclosing the current block.
    pub fn current_level(&self) -> i32 {
        let mut level = -1;
        let mut b = self.current;
        while let Some(bid) = b {
            if self.block(bid).proc.is_some() {
                level += 1;
            }
            b = self.block(bid).surr;
        }
        level
    }

    /// Depth of a block within its procedure (procedure block = 0).
    pub fn block_level(&self, block: BlockId) -> i32 {
        let mut level = -1;
        let mut b = Some(block);
        while let Some(bid) = b {
            level += 1;
            if self.block(bid).proc.is_some() {
                break;
            }
            b = self.block(bid).surr;
        }
        assert!(level >= 0);
        level
    }

    /// The procedure block enclosing (or equal to) the given block.
    pub fn proc_block(&self, block: BlockId) -> Option<BlockId> {
        let mut b = Some(block);
        while let Some(bid) = b {
            if self.block(bid).proc.is_some() {
                return Some(bid);
            }
            b = self.block(bid).surr;
        }
        None
    }

    /// The dummy procedure block holding the formals of `proc`.
    pub fn proc_block_of(&self, proc: IdentId) -> Option<BlockId> {
        self.all_blocks().find(|&b| self.block(b).proc == Some(proc))
    }

    /// Whether the block has local labels referenced in any
    /// designational expression.
    pub fn has_labels(&self, block: BlockId) -> bool {
        self.block(block).idents.iter().any(|&i| {
            let id = self.ident(i);
            id.flags == IdentFlags::LABEL && id.ssn_used != 0
        })
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> Handler {
        Handler::new("t.alg", 0, true, false)
    }

    #[test]
    fn test_enter_creates_numbered_blocks() {
        let mut t = SymbolTable::new();
        let b0 = t.enter_block(None, 0);
        let b1 = t.enter_block(None, 3);
        assert_eq!(b0, BlockId(0));
        assert_eq!(b1, BlockId(1));
        assert_eq!(t.block(b1).surr, Some(b0));
        assert_eq!(t.cur(), b1);
        t.leave_block();
        assert_eq!(t.cur(), b0);
    }

    #[test]
    fn test_look_up_creates_on_first_pass() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        t.enter_block(None, 0);
        let a = t.look_up("x", false, 5, false, &mut d).unwrap();
        let b = t.look_up("x", false, 9, false, &mut d).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.ident(a).ssn_used, 5);
    }

    #[test]
    fn test_multiply_declared() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        t.enter_block(None, 0);
        let a = t.look_up("x", true, 2, false, &mut d).unwrap();
        t.ident_mut(a).flags = IdentFlags::REAL;
        let b = t.look_up("x", true, 4, false, &mut d).unwrap();
        assert_ne!(a, b);
        assert_eq!(d.error_count(), 1);
        // the first declaration still wins name search
        assert_eq!(t.find_in_block(t.cur(), "x"), Some(a));
    }

    #[test]
    fn test_undeclared_bubble_up() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        let env = t.enter_block(None, 0);
        t.enter_block(None, 2);
        let inner = t.look_up("f", false, 3, false, &mut d).unwrap();
        assert_eq!(t.ident(inner).block, BlockId(1));
        t.leave_block();
        // `f' migrated into the environmental block
        let found = t.find_in_block(env, "f").expect("migrated");
        assert_eq!(t.ident(found).ssn_used, 3);
        assert!(t.block(BlockId(1)).idents.is_empty());
    }

    #[test]
    fn test_declared_idents_stay() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        t.enter_block(None, 0);
        let b1 = t.enter_block(None, 2);
        let x = t.look_up("x", true, 2, false, &mut d).unwrap();
        t.ident_mut(x).flags = IdentFlags::INT;
        t.leave_block();
        assert_eq!(t.block(b1).idents, vec![x]);
    }

    #[test]
    fn test_second_pass_walk() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        // pass 1 builds: env { inner { x } }
        t.enter_block(None, 0);
        t.enter_block(None, 2);
        let x = t.look_up("x", true, 2, false, &mut d).unwrap();
        t.ident_mut(x).flags = IdentFlags::REAL;
        t.leave_block();
        t.leave_block();
        // pass 2 walks the same tree
        t.set_pass(Pass::Second);
        assert_eq!(t.enter_block(None, 0), BlockId(0));
        assert_eq!(t.enter_block(None, 2), BlockId(1));
        let found = t.look_up("x", false, 7, false, &mut d).unwrap();
        assert_eq!(found, x);
        t.leave_block();
        // from the outer block the walk still finds nothing for `y'
        assert!(t.find_in_block(t.cur(), "x").is_none());
    }

    #[test]
    fn test_bound_context_check() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        t.enter_block(None, 0);
        t.enter_block(None, 2);
        let n = t.look_up("n", true, 2, false, &mut d).unwrap();
        t.ident_mut(n).flags = IdentFlags::INT;
        t.leave_block();
        t.leave_block();
        t.set_pass(Pass::Second);
        t.enter_block(None, 0);
        t.enter_block(None, 2);
        t.look_up("n", false, 3, true, &mut d).unwrap();
        assert_eq!(d.error_count(), 1);
    }

    #[test]
    fn test_levels() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        let _env = t.enter_block(None, 0);
        // a procedure p with a body block
        let p = {
            let id = t.look_up("p", true, 1, false, &mut d).unwrap();
            t.ident_mut(id).flags = IdentFlags::PROC;
            id
        };
        let pb = t.enter_block(Some(p), 1);
        let body = t.enter_block(None, 1);
        assert_eq!(t.current_level(), 0);
        assert_eq!(t.block_level(pb), 0);
        assert_eq!(t.block_level(body), 1);
        assert_eq!(t.proc_block(body), Some(pb));
        assert_eq!(t.proc_block_of(p), Some(pb));
        let x = t.look_up("x", true, 2, false, &mut d).unwrap();
        t.ident_mut(x).flags = IdentFlags::REAL;
        assert_eq!(t.dsa_level(x), 0);
    }

    #[test]
    fn test_has_labels() {
        let mut t = SymbolTable::new();
        let mut d = handler();
        let b = t.enter_block(None, 0);
        let l = t.look_up("lab", true, 2, false, &mut d).unwrap();
        t.ident_mut(l).flags = IdentFlags::LABEL;
        assert!(!t.has_labels(b));
        t.ident_mut(l).ssn_used = 4;
        assert!(t.has_labels(b));
    }
}

//! Iterative-deepening alpha-beta search with quiescence.
//!
//! The driver runs full-window root searches at increasing depth until the
//! clock, an external signal or the depth limit stops it. Node features,
//! in order: draw and insufficient-material handling, mate-distance
//! pruning, transposition probe, endgame-bitbase probe, null-move pruning,
//! internal iterative deepening, and per-move extensions, futility pruning
//! and late-move reductions around a principal-variation window.

pub mod ordering;
pub mod time;
pub mod values;

use std::time::{Duration, Instant};

use crate::board::pst::PC_VAL;
use crate::board::types::{Move, Piece};
use crate::board::{Board, Evaluator};
use crate::egbb::Tablebases;
use crate::tt::{val_to_tt, Bound, TranspositionTable};

use ordering::BAD_SCORE;
use time::Deadlines;
use values::{
    is_mate_score, mate, MAX_PLY, VAL_AVOID_NULL, VAL_DRAW, VAL_INF, VAL_LIM_MATE, VAL_NONE,
};

/// Futility margin per remaining ply of depth.
const FUT_MARGIN: i32 = 100;
/// Null-move depth reduction.
const NULL_R: i32 = 3;
/// Nodes between abort checks.
const POLL_INTERVAL: u64 = 0x400;

/// How the controller classifies a line arriving during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdType {
    /// Ignore for now, handle after the search.
    Continue,
    /// Handle immediately, keep searching.
    ExecAndContinue,
    /// Stop searching, play the best move, then handle input.
    Finish,
    /// Cancel the search and discard its result.
    Cancel,
    /// No pending input.
    None,
}

/// Live search figures handed to the input poller (the "." reply needs
/// them while the search is still running).
pub struct SearchStatus<'a> {
    pub depth: i32,
    pub nnodes: u64,
    pub nmoves: usize,
    pub nmoves_left: usize,
    pub san_move: &'a str,
    pub elapsed: Duration,
}

/// Non-blocking command source the search polls between nodes.
pub trait InputSource {
    fn poll(&mut self, status: &SearchStatus) -> CmdType;
}

/// An input source with no input, for tests and offline search.
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _status: &SearchStatus) -> CmdType {
        CmdType::None
    }
}

/// The expected sequence of best moves.
#[derive(Clone)]
pub struct PvLine {
    pub nmoves: usize,
    pub moves: [Move; MAX_PLY],
}

impl PvLine {
    #[must_use]
    pub fn new() -> Self {
        PvLine {
            nmoves: 0,
            moves: [Move::NULL; MAX_PLY],
        }
    }

    /// This line becomes `mv` followed by the child's line.
    fn set(&mut self, mv: Move, child: &PvLine) {
        self.moves[0] = mv;
        let n = child.nmoves.min(MAX_PLY - 1);
        self.moves[1..=n].copy_from_slice(&child.moves[..n]);
        self.nmoves = n + 1;
    }
}

impl Default for PvLine {
    fn default() -> Self {
        PvLine::new()
    }
}

/// Search bookkeeping that outlives the move loop.
pub struct SearchData {
    /// Time's up or the search was cancelled.
    pub stop_search: bool,
    /// Type of the pending command, if any.
    pub cmd_type: CmdType,
    /// Depth of the running iteration.
    pub depth: i32,
    pub nmoves: usize,
    pub nmoves_left: usize,
    /// Half moves played before the search started.
    pub root_ply: usize,
    pub nnodes: u64,
    pub nqs_nodes: u64,
    pub nhash_probes: u64,
    pub nhash_hits: u64,
    pub t_start: Instant,
    pub deadlines: Deadlines,
    /// Effective branching factor of the last search.
    pub bfactor: f64,
    /// Root move currently being searched, in SAN.
    pub san_move: String,
    pub pv: PvLine,
    /// Best root move, assigned after the search.
    pub mv: Move,
}

impl SearchData {
    #[must_use]
    pub fn new() -> Self {
        SearchData {
            stop_search: false,
            cmd_type: CmdType::Continue,
            depth: 0,
            nmoves: 0,
            nmoves_left: 0,
            root_ply: 0,
            nnodes: 0,
            nqs_nodes: 0,
            nhash_probes: 0,
            nhash_hits: 0,
            t_start: Instant::now(),
            deadlines: Deadlines::unlimited(),
            bfactor: 0.0,
            san_move: String::new(),
            pv: PvLine::new(),
            mv: Move::NULL,
        }
    }

    /// One-line stats summary for debug output.
    #[must_use]
    pub fn summary(&self, elapsed: Duration) -> String {
        let total = self.nnodes + self.nqs_nodes;
        let secs = elapsed.as_secs_f64().max(0.001);
        let hash_rate = if self.nhash_probes > 0 {
            (self.nhash_hits as f64 / self.nhash_probes as f64) * 100.0
        } else {
            0.0
        };
        format!(
            "nodes: {} ({} qs), {:.0} nps, hash hits: {:.1}%, bfactor: {:.2}",
            total,
            self.nqs_nodes,
            total as f64 / secs,
            hash_rate,
            self.bfactor
        )
    }
}

impl Default for SearchData {
    fn default() -> Self {
        SearchData::new()
    }
}

/// Output options for the root driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchReport {
    pub show_pv: bool,
    /// Print in the GUI protocol's "depth score centisec nodes pv" shape.
    pub xboard: bool,
}

/// One search over one position. Borrows the persistent tables; owns a
/// private copy of the game board to move around on.
pub struct Searcher<'a> {
    pub board: Board,
    tt: &'a mut TranspositionTable,
    eval: &'a mut Evaluator,
    egbb: &'a Tablebases,
    input: &'a mut dyn InputSource,
    report: SearchReport,
    pub sd: SearchData,
    killers: [[Move; 2]; MAX_PLY],
}

impl<'a> Searcher<'a> {
    pub fn new(
        board: &Board,
        tt: &'a mut TranspositionTable,
        eval: &'a mut Evaluator,
        egbb: &'a Tablebases,
        input: &'a mut dyn InputSource,
        report: SearchReport,
    ) -> Self {
        Searcher {
            board: board.clone(),
            tt,
            eval,
            egbb,
            input,
            report,
            sd: SearchData::new(),
            killers: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    /// Check the clock and the input channel. True means unwind.
    fn cancel_or_timeout(&mut self) -> bool {
        let now = Instant::now();
        let strict_up = self.sd.deadlines.strict.map_or(false, |t| now > t);
        // Past the first root move the iteration is usually close to done,
        // and finishing it buys a better move, so only the soft deadline
        // applies there.
        let soft_up = self.sd.deadlines.soft.map_or(false, |t| now > t)
            && self.sd.nmoves_left == self.sd.nmoves;
        if strict_up || soft_up {
            self.sd.stop_search = true;
            return true;
        }

        let status = SearchStatus {
            depth: self.sd.depth,
            nnodes: self.sd.nnodes + self.sd.nqs_nodes,
            nmoves: self.sd.nmoves,
            nmoves_left: self.sd.nmoves_left,
            san_move: &self.sd.san_move,
            elapsed: now.duration_since(self.sd.t_start),
        };
        match self.input.poll(&status) {
            CmdType::Finish => {
                self.sd.stop_search = true;
                self.sd.cmd_type = CmdType::Finish;
                true
            }
            CmdType::Cancel => {
                self.sd.stop_search = true;
                self.sd.cmd_type = CmdType::Cancel;
                true
            }
            _ => false,
        }
    }

    /// The side to move still has enough material to win.
    fn can_win(&self) -> bool {
        let color = self.board.side_to_move();
        self.board.side_pieces(color, Piece::Pawn.index()) != 0
            || self.board.material(color) >= PC_VAL[Piece::Rook.index()]
    }

    /// Tighten the window knowing no shorter mate than `ply` is possible.
    /// A non-`None` result cuts the node off.
    fn mate_distance_pruning(&self, alpha: &mut i32, beta: &mut i32, ply: i32) -> Option<i32> {
        // Lower bound.
        let mut val = mate(ply + 2);
        if val > *alpha && self.board.is_mate() {
            val = mate(ply);
        }
        if val > *alpha {
            *alpha = val;
            if val >= *beta {
                return Some(val);
            }
        }
        // Upper bound.
        val = -mate(ply + 1);
        if val < *beta {
            *beta = val;
            if val <= *alpha {
                return Some(val);
            }
        }
        None
    }

    /// A pawn move onto its seventh rank threatens promotion.
    fn pawn_threat(&self, mv: Move) -> bool {
        use crate::board::masks::SEVENTH_RANK;
        mv.piece() == Piece::Pawn
            && crate::board::bits::bit(mv.to()) & (SEVENTH_RANK[0] | SEVENTH_RANK[1]) != 0
    }

    /// The move is a forced retaliation of equal class on the square the
    /// opponent just captured on.
    fn is_recapture(&self, mv: Move, score: i32) -> bool {
        let prev = self.board.pos().mv;
        if score <= 0 || prev.is_null() || mv.to() != prev.to() {
            return false;
        }
        let capt = mv.captured();
        match prev.captured() {
            Some(Piece::Pawn) => capt == Some(Piece::Pawn),
            Some(Piece::Knight) | Some(Piece::Bishop) => {
                matches!(capt, Some(Piece::Knight) | Some(Piece::Bishop))
            }
            Some(Piece::Rook) => capt == Some(Piece::Rook),
            Some(Piece::Queen) => capt == Some(Piece::Queen),
            _ => false,
        }
    }

    /// Quiescence: when not in check, stand pat on the static eval and try
    /// only moves that can improve it. In check all evasions are searched.
    fn qs_search(&mut self, mut alpha: i32, mut beta: i32, depth: i32) -> i32 {
        debug_assert!(alpha < beta);
        self.sd.nqs_nodes += 1;

        if beta > VAL_DRAW && !self.can_win() {
            if alpha >= VAL_DRAW {
                return VAL_DRAW;
            }
            beta = VAL_DRAW;
        }

        let ply = (self.board.ply() - self.sd.root_ply) as i32;
        debug_assert!(ply >= 1);

        if let Some(val) = self.mate_distance_pruning(&mut alpha, &mut beta, ply) {
            return val;
        }

        if alpha < VAL_LIM_MATE && beta > -VAL_LIM_MATE {
            if let Some(val) = self.egbb.probe(&self.board, ply, depth) {
                return val;
            }
        }

        if ply >= MAX_PLY as i32 - 1 {
            return self.eval.eval(&self.board);
        }

        let in_check = self.board.in_check();
        let mut list;
        if !in_check {
            let val = self.eval.eval(&self.board);
            if val > alpha {
                if val >= beta {
                    return beta;
                }
                alpha = val;
            }

            if depth >= 0 {
                list = self.board.generate_moves();
                if list.is_empty() {
                    return VAL_DRAW;
                }
            } else {
                list = self.board.generate_qs_moves();
                // A possible stalemate, but the quiescence search does not
                // care.
                if list.is_empty() {
                    return alpha;
                }
            }
        } else {
            list = self.board.generate_moves();
            if list.is_empty() {
                return mate(ply);
            }
        }

        ordering::score_qs_moves(&self.board, &mut list);
        for i in 0..list.len() {
            let mv = list.pick_next(i);
            if !in_check && list.score(i) == BAD_SCORE {
                return alpha;
            }

            self.board.make_move(mv);
            let val = -self.qs_search(-beta, -alpha, depth - 1);
            self.board.undo_move();

            if val > alpha {
                if val >= beta {
                    return beta;
                }
                alpha = val;
            }
        }

        alpha
    }

    /// Null-move pruning. True means the node fails high at `beta`; the
    /// depth may be extended instead when the null search smells a mate
    /// threat.
    fn null_move_pruning(&mut self, beta: i32, depth: &mut i32, in_pv: bool) -> bool {
        if in_pv
            || self.board.pos().mv.is_null()
            || self.board.in_check()
            || *depth < 3
            || is_mate_score(beta)
            || self.board.material(self.board.side_to_move()) <= PC_VAL[Piece::Knight.index()]
            || self.eval.eval(&self.board) < beta
        {
            return false;
        }

        self.board.make_nullmove();
        let val = -self.search(-beta, -beta + 1, *depth - NULL_R, false, None);
        self.board.undo_nullmove();

        if self.sd.stop_search {
            return false;
        }

        if val >= beta {
            let ply = (self.board.ply() - self.sd.root_ply) as i32;
            self.tt.store(
                *depth,
                val_to_tt(beta, ply),
                Bound::Beta,
                self.board.key(),
                Move::NULL,
                self.sd.root_ply as i32,
            );
            return true;
        } else if val < -VAL_LIM_MATE {
            *depth += 1;
        }
        false
    }

    /// Internal iterative deepening: a reduced search to get a hash move
    /// on PV nodes that have none.
    fn iid(&mut self, alpha: i32, beta: i32, depth: i32) -> Move {
        debug_assert!(depth > 0);
        let val = self.search(alpha, beta, depth, true, None);
        if val <= alpha {
            let _ = self.search(-VAL_INF, beta, depth, true, None);
        }
        self.tt.hash_move(self.board.key())
    }

    #[allow(clippy::too_many_lines)]
    fn search(
        &mut self,
        mut alpha: i32,
        mut beta: i32,
        mut depth: i32,
        in_pv: bool,
        mut pv: Option<&mut PvLine>,
    ) -> i32 {
        debug_assert!(alpha >= -VAL_INF && beta <= VAL_INF && alpha < beta);

        if self.sd.stop_search {
            return VAL_NONE;
        }
        if let Some(p) = pv.as_deref_mut() {
            p.nmoves = 0;
        }

        self.sd.nnodes += 1;
        if self.sd.nnodes % POLL_INTERVAL == 0 && self.cancel_or_timeout() {
            return VAL_NONE;
        }

        let key = self.board.key();
        if self.board.fifty() >= 100 || self.board.repetition_count(1) > 0 {
            return VAL_DRAW;
        }

        if beta > VAL_DRAW && !self.can_win() {
            if alpha >= VAL_DRAW {
                return VAL_DRAW;
            }
            beta = VAL_DRAW;
        }

        let ply = (self.board.ply() - self.sd.root_ply) as i32;
        debug_assert!(ply >= 1);

        if let Some(val) = self.mate_distance_pruning(&mut alpha, &mut beta, ply) {
            return val;
        }

        // Transposition table lookup.
        let mut best_move = Move::NULL;
        let mut avoid_null = false;
        let val = self.tt.probe(depth, alpha, beta, key, ply, &mut best_move);
        self.sd.nhash_probes += 1;
        match val {
            VAL_NONE => {
                if !best_move.is_null() {
                    self.sd.nhash_hits += 1;
                }
            }
            VAL_AVOID_NULL => {
                self.sd.nhash_hits += 1;
                avoid_null = true;
            }
            _ => {
                self.sd.nhash_hits += 1;
                if !in_pv {
                    return val;
                }
            }
        }

        if alpha < VAL_LIM_MATE && beta > -VAL_LIM_MATE {
            if let Some(val) = self.egbb.probe(&self.board, ply, depth) {
                return val;
            }
        }

        // Quiescence search at leaf nodes.
        if depth <= 0 || ply >= MAX_PLY as i32 - 1 {
            return self.qs_search(alpha, beta, 0);
        }

        if !avoid_null && self.null_move_pruning(beta, &mut depth, in_pv) {
            return beta;
        }
        if self.sd.stop_search {
            return VAL_NONE;
        }

        debug_assert!(depth > 0);
        let in_check = self.board.in_check();

        let mut list = self.board.generate_moves();
        if list.is_empty() {
            if in_check {
                return mate(ply);
            }
            return VAL_DRAW;
        } else if list.len() == 1 {
            depth += 1;
            best_move = list.get(0);
        }

        // Internal iterative deepening.
        if depth >= 3 && in_pv && best_move.is_null() {
            best_move = self.iid(alpha, beta, depth - 2);
            if self.sd.stop_search {
                return VAL_NONE;
            }
        }

        ordering::score_moves(&self.board, best_move, &self.killers, ply as usize, &mut list);

        let orig_alpha = alpha;
        let mut best_val = -VAL_INF;
        let mut fut_score = VAL_INF;
        let want_pv = pv.is_some();
        let mut child_pv = PvLine::new();

        for i in 0..list.len() {
            let mv = list.pick_next(i);
            let score = list.score(i);
            let extend = mv.is_check() || self.pawn_threat(mv) || self.is_recapture(mv, score);
            let tactical = extend || mv.is_capture() || self.board.is_passer_move(mv);
            let bad_score = score == BAD_SCORE;

            // Futility pruning against an optimistic evaluation.
            if depth < 3
                && !in_check
                && !tactical
                && !in_pv
                && i > 0
                && alpha < VAL_LIM_MATE
                && bad_score
            {
                if fut_score == VAL_INF {
                    fut_score = self.eval.eval(&self.board) + FUT_MARGIN * depth;
                }
                if fut_score <= alpha {
                    continue;
                }
            }

            let mut reduced = false;
            let mut new_depth = depth - 1;

            self.board.make_move(mv);

            if extend {
                new_depth += 1;
            } else if i > 2 && depth > 2 && !in_check && !in_pv && !tactical && bad_score {
                // Late move reduction.
                new_depth -= 1;
                reduced = true;
            }

            let mut val;
            if !in_pv || best_val == -VAL_INF {
                val = -self.search(
                    -beta,
                    -alpha,
                    new_depth,
                    in_pv,
                    if want_pv { Some(&mut child_pv) } else { None },
                );
            } else {
                val = -self.search(-alpha - 1, -alpha, new_depth, false, None);
                if val > alpha && val < beta {
                    val = -self.search(
                        -beta,
                        -alpha,
                        new_depth,
                        true,
                        if want_pv { Some(&mut child_pv) } else { None },
                    );
                }
            }

            // A reduced move that fails high gets a full-depth re-search.
            if reduced && val >= beta {
                new_depth += 1;
                val = -self.search(
                    -beta,
                    -alpha,
                    new_depth,
                    in_pv,
                    if want_pv { Some(&mut child_pv) } else { None },
                );
            }
            self.board.undo_move();

            if self.sd.stop_search {
                return VAL_NONE;
            }

            // Fail high.
            if val >= beta {
                if !in_check && !tactical && mv != self.killers[ply as usize][0] {
                    self.killers[ply as usize][1] = self.killers[ply as usize][0];
                    self.killers[ply as usize][0] = mv;
                }
                self.tt
                    .store(depth, val_to_tt(beta, ply), Bound::Beta, key, mv, self.sd.root_ply as i32);
                return beta;
            }
            if val > best_val {
                best_val = val;
                best_move = mv;
                if val > alpha {
                    alpha = val;
                    if let Some(p) = pv.as_deref_mut() {
                        p.set(mv, &child_pv);
                    }
                }
            }
        }

        let flag = if alpha <= orig_alpha {
            Bound::Alpha
        } else {
            Bound::Exact
        };
        self.tt.store(
            depth,
            val_to_tt(alpha, ply),
            flag,
            key,
            best_move,
            self.sd.root_ply as i32,
        );

        alpha
    }

    fn search_root(&mut self, depth: i32, movep: &mut Move) -> i32 {
        debug_assert!(depth > 0);

        let mut alpha = -VAL_INF;
        let beta = VAL_INF;

        self.sd.nnodes = 1;
        self.sd.nqs_nodes = 0;
        self.sd.nhash_probes = 0;
        self.sd.nhash_hits = 0;
        self.sd.nmoves = 0;
        self.sd.nmoves_left = 0;

        let key = self.board.key();

        // Start from the best root move of the previous iteration, else
        // whatever the hash table suggests.
        let mut best_move = if !movep.is_null() {
            *movep
        } else {
            self.sd.nhash_probes += 1;
            let hm = self.tt.hash_move(key);
            if !hm.is_null() {
                self.sd.nhash_hits += 1;
            }
            hm
        };

        let mut list = self.board.generate_moves();
        self.sd.nmoves = list.len();
        ordering::score_moves(&self.board, best_move, &self.killers, 0, &mut list);

        let mut new_pv = PvLine::new();
        for i in 0..list.len() {
            let mv = list.pick_next(i);
            self.sd.nmoves_left = list.len() - i;
            self.sd.san_move = self.board.move_to_san(mv);

            let extend = mv.is_check() || self.pawn_threat(mv);
            let mut new_depth = depth - 1;
            if extend {
                new_depth += 1;
            }

            self.board.make_move(mv);
            let val = if i == 0 {
                -self.search(-beta, -alpha, new_depth, true, Some(&mut new_pv))
            } else {
                let mut v = -self.search(-alpha - 1, -alpha, new_depth, false, None);
                if v > alpha && v < beta {
                    v = -self.search(-beta, -alpha, new_depth, true, Some(&mut new_pv));
                }
                v
            };
            self.board.undo_move();

            // An aborted iteration still commits the best move seen so
            // far, as long as an earlier iteration confirmed one.
            if self.sd.stop_search && !movep.is_null() && i > 0 {
                *movep = best_move;
                self.tt.store(
                    depth,
                    val_to_tt(alpha, 0),
                    Bound::Beta,
                    key,
                    best_move,
                    self.sd.root_ply as i32,
                );
            }
            if self.sd.stop_search {
                return VAL_NONE;
            }

            debug_assert!(val < beta);
            if val > alpha {
                alpha = val;
                best_move = mv;
                self.sd.pv.set(mv, &new_pv);
            }
        }

        *movep = best_move;
        self.tt.store(
            depth,
            val_to_tt(alpha, 0),
            Bound::Exact,
            key,
            best_move,
            self.sd.root_ply as i32,
        );

        // An iteration that already overran the soft deadline will not get
        // a deeper one.
        if let Some(soft) = self.sd.deadlines.soft {
            if Instant::now() > soft {
                self.sd.deadlines.strict = Some(soft);
            }
        }

        alpha
    }

    fn print_pv(&mut self, depth: i32, score: i32, nnodes: u64) {
        let elapsed = self.sd.t_start.elapsed();
        if self.report.xboard {
            print!("{} {} {} {}", depth, score, elapsed.as_millis() / 10, nnodes);
        } else {
            let minutes = elapsed.as_secs() / 60;
            let seconds = elapsed.as_secs() % 60;
            let sign = if score >= 0 { "+" } else { "" };
            print!(
                "{depth:2}  {sign}{:.2}  {minutes:02}:{seconds:02}  {nnodes:10} ",
                f64::from(score) / 100.0
            );
        }

        // Walk the pv, patching holes from the hash table: a forced mate
        // can leave the line short.
        let mut tmp_board = self.board.clone();
        for i in 0..depth as usize {
            let mv = if i < self.sd.pv.nmoves {
                self.sd.pv.moves[i]
            } else {
                self.tt.hash_move(tmp_board.key())
            };
            if mv.is_null() || !tmp_board.generate_moves().contains(mv) {
                break;
            }
            print!(" {}", tmp_board.move_to_san(mv));
            tmp_board.make_move(mv);
        }
        println!();
    }

    /// Iterative deepening search. Returns the score of the deepest
    /// completed iteration, signed for White; the chosen move lands in
    /// `sd.mv`. A non-null `test_move` stops the iteration once it comes
    /// out best (test-suite harness).
    pub fn id_search(&mut self, max_depth: i32, test_move: Move, deadlines: Deadlines) -> i32 {
        self.sd.t_start = Instant::now();
        self.sd.stop_search = false;
        self.sd.deadlines = deadlines;
        self.sd.cmd_type = CmdType::Continue;
        self.sd.root_ply = self.board.ply();
        self.sd.mv = Move::NULL;
        self.killers = [[Move::NULL; 2]; MAX_PLY];

        // A position already drawn by rule scores zero without searching.
        // The first legal move stands in so a move is still returned.
        if self.board.fifty() >= 100 || self.board.repetition_count(1) > 0 {
            let list = self.board.generate_moves();
            if !list.is_empty() {
                self.sd.mv = list.get(0);
                return VAL_DRAW;
            }
        }

        let mut mv = Move::NULL;
        let mut last_score = 0;
        let mut last_nnodes = 0u64;
        let mut total_nnodes = 0u64;
        let mut total_nqs_nodes = 0u64;
        let mut nhash_probes = 0u64;
        let mut nhash_hits = 0u64;

        for depth in 1..=max_depth {
            self.sd.depth = depth;
            let val = self.search_root(depth, &mut mv);
            total_nqs_nodes += self.sd.nqs_nodes;
            nhash_probes += self.sd.nhash_probes;
            nhash_hits += self.sd.nhash_hits;
            if self.sd.stop_search {
                break;
            }
            last_nnodes = total_nnodes;
            last_score = val;
            total_nnodes += self.sd.nnodes;
            if self.report.show_pv && depth > 1 {
                self.print_pv(depth, val, total_nnodes + total_nqs_nodes);
            }
            if !mv.is_null() && mv == test_move {
                break;
            }
        }

        self.sd.bfactor = if last_nnodes > 0 {
            total_nnodes as f64 / last_nnodes as f64
        } else {
            total_nnodes as f64
        };
        if self.sd.stop_search {
            total_nnodes += self.sd.nnodes;
        }
        self.sd.nnodes = total_nnodes;
        self.sd.nqs_nodes = total_nqs_nodes;
        self.sd.nhash_probes = nhash_probes;
        self.sd.nhash_hits = nhash_hits;
        self.sd.mv = mv;

        self.board.side_to_move().sign() * last_score
    }
}

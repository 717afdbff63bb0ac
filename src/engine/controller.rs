//! The game controller: owns the board, the persistent tables, the book
//! and the command loop for both protocols.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use log::{error, info};

use crate::board::pst::MAX_PHASE;
use crate::board::types::piece::ALL;
use crate::board::{Board, Color, Evaluator, Move, MoveParseError, Piece, START_FEN};
use crate::book::Book;
use crate::config::{BookMode, EgbbLoadType, Settings};
use crate::egbb::Tablebases;
use crate::perft::perft_root;
use crate::search::time::{allocate_time, Deadlines, TimeParams};
use crate::search::values::{MAX_PLY, VAL_RESIGN};
use crate::search::{CmdType, InputSource, SearchReport, SearchStatus, Searcher};
use crate::tt::TranspositionTable;

use super::gamelog::{log_error_line, GameLog};
use super::protocol::{
    classify, feature_string, first_word, is_known_xb_command, parse_level, rest_of, Protocol,
};
use super::{APP_NAME, APP_VERSION};

/// Session state that mid-search commands may touch.
struct Session {
    protocol: Protocol,
    analyze: bool,
    show_pv: bool,
    debug: bool,
    /// When the engine's clock for this time control runs out.
    tc_end: Option<Instant>,
    op_name: String,
}

/// Lines from stdin, read by a background thread, polled without blocking.
struct InputQueue {
    rx: Receiver<String>,
    pending: VecDeque<String>,
    eof: bool,
}

impl InputQueue {
    fn start() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .expect("can't spawn the stdin reader");
        InputQueue {
            rx,
            pending: VecDeque::new(),
            eof: false,
        }
    }

    /// A fresh line from the channel, if one is waiting.
    fn try_fetch(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.eof = true;
                None
            }
        }
    }

    /// Queue a line for handling after the search.
    fn defer(&mut self, line: String) {
        self.pending.push_back(line);
    }

    /// Next line to execute: deferred lines first, then a blocking read.
    /// `None` on end of input.
    fn read_line(&mut self) -> Option<String> {
        if let Some(line) = self.pending.pop_front() {
            return Some(line);
        }
        if self.eof {
            return None;
        }
        match self.rx.recv() {
            Ok(line) => Some(line),
            Err(_) => {
                self.eof = true;
                None
            }
        }
    }
}

/// Executes the session-level EXEC_AND_CONTINUE commands that may not
/// wait for the search to end. Returns false when the command has to be
/// deferred to the controller instead.
fn exec_during_search(line: &str, session: &mut Session, status: &SearchStatus) -> bool {
    let cmd = first_word(line);
    let args = rest_of(line);
    match cmd {
        "ping" => {
            println!("pong {args}");
            true
        }
        "time" => {
            let centis: i64 = args.parse().unwrap_or(0);
            session.tc_end = if centis > 0 {
                Some(Instant::now() + Duration::from_millis(centis as u64 * 10))
            } else {
                None
            };
            true
        }
        "otim" | "accepted" | "rejected" | "computer" => true,
        "post" => {
            session.show_pv = true;
            true
        }
        "nopost" => {
            session.show_pv = false;
            true
        }
        "name" => {
            session.op_name = args.to_string();
            true
        }
        "." if session.analyze => {
            println!(
                "stat01: {} {} {} {} {} {}",
                status.elapsed.as_millis() / 10,
                status.nnodes,
                status.depth,
                status.nmoves_left,
                status.nmoves,
                status.san_move
            );
            true
        }
        _ => false,
    }
}

/// The input poller handed to the search: classifies fresh lines, runs
/// what can run, defers the rest, and reports stop requests.
struct SearchPoller<'a> {
    input: &'a mut InputQueue,
    session: &'a mut Session,
}

impl InputSource for SearchPoller<'_> {
    fn poll(&mut self, status: &SearchStatus) -> CmdType {
        while let Some(line) = self.input.try_fetch() {
            match classify(&line, self.session.protocol, self.session.analyze) {
                CmdType::ExecAndContinue => {
                    if !exec_during_search(&line, self.session, status) {
                        self.input.defer(line);
                    }
                }
                CmdType::Continue | CmdType::None => self.input.defer(line),
                CmdType::Finish => return CmdType::Finish,
                CmdType::Cancel => {
                    self.input.defer(line);
                    return CmdType::Cancel;
                }
            }
        }
        CmdType::None
    }
}

/// Both sides are down to a lone king, or king and one minor piece.
fn insufficient_material(board: &Board) -> bool {
    for color in [Color::White, Color::Black] {
        let all = board.side_pieces(color, ALL);
        let minors_and_king = board.side_pieces(color, Piece::King.index())
            | board.side_pieces(color, Piece::Knight.index())
            | board.side_pieces(color, Piece::Bishop.index());
        if all.count_ones() > 2 || all != minors_and_king {
            return false;
        }
    }
    true
}

pub struct Engine {
    board: Board,
    tt: TranspositionTable,
    eval: Evaluator,
    book: Book,
    egbb: Tablebases,
    settings: Settings,
    session: Session,
    input: InputQueue,
    gamelog: GameLog,
    cpu_color: Option<Color>,
    game_over: bool,
    /// The engine's previous move came out of the book.
    in_book: bool,
    max_depth: i32,
    nmoves_per_tc: u32,
    increment_ms: u64,
}

impl Engine {
    /// Build the engine from settings. Failing to allocate the main hash
    /// table is the one startup error that cannot be degraded away.
    pub fn new(settings: Settings) -> Result<Self, String> {
        let tt = TranspositionTable::new(settings.hash_mb)
            .map_err(|err| format!("{err} ({} MB)", settings.hash_mb))?;

        let book = Book::open(settings.book_mode, &settings.book_file);

        // The in-process bitbase loader is not linked in; a configured
        // path only documents the intent and the facade stays empty.
        if settings.egbb_load_type != EgbbLoadType::Off && !settings.egbb_path.is_empty() {
            info!("no bitbase backend available, probes disabled");
        }
        let egbb = Tablebases::disabled();

        let mut settings = settings;
        if settings.use_learning && settings.book_mode != BookMode::Mem {
            info!("book learning needs the in-memory book mode");
            settings.use_learning = false;
        }

        let gamelog = GameLog::new(settings.use_log);

        Ok(Engine {
            board: Board::new(),
            tt,
            eval: Evaluator::new(),
            book,
            egbb,
            settings,
            session: Session {
                protocol: Protocol::Native,
                analyze: false,
                show_pv: true,
                debug: false,
                tc_end: None,
                op_name: String::new(),
            },
            input: InputQueue::start(),
            gamelog,
            cpu_color: Some(Color::Black),
            game_over: false,
            in_book: false,
            max_depth: MAX_PLY as i32 - 1,
            nmoves_per_tc: 0,
            increment_ms: 2000,
        })
    }

    /// Start a new game from `fen`. On a bad FEN the game state is left
    /// untouched.
    pub fn new_game(&mut self, fen: &str, cpu_color: Option<Color>) {
        match Board::from_fen(fen) {
            Ok(board) => {
                self.board = board;
                self.game_over = false;
                self.in_book = false;
                self.cpu_color = cpu_color;
                self.gamelog.clear();
            }
            Err(err) => println!("Invalid FEN string ({err}): {fen}"),
        }
    }

    /// Flush learning and the book to disk on the way out.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.book.save() {
            error!("can't save the opening book: {err}");
            log_error_line(self.gamelog.enabled(), "book save failed, aborted");
            std::process::exit(1);
        }
    }

    /// Print the game result if the position ends the game.
    fn check_game_over(&mut self) -> bool {
        let list = self.board.generate_moves();
        if list.is_empty() {
            if self.board.in_check() {
                if self.board.side_to_move() == Color::Black {
                    println!("1-0 {{White mates}}");
                } else {
                    println!("0-1 {{Black mates}}");
                }
            } else {
                println!("1/2-1/2 {{Stalemate}}");
            }
            return true;
        }
        if self.board.repetition_count(3) >= 2 {
            println!("1/2-1/2 {{Draw by repetition}}");
            return true;
        }
        if insufficient_material(&self.board) {
            println!("1/2-1/2 {{Insufficient mating material}}");
            return true;
        }
        if self.board.fifty() >= 100 {
            println!("1/2-1/2 {{Draw by 50 move rule}}");
            return true;
        }
        false
    }

    /// Make a move on the game board, log it, and detect game end.
    fn update_game(&mut self, mv: Move) {
        debug_assert!(!self.game_over);
        self.board.make_move(mv);
        if self.session.protocol == Protocol::Native {
            print!("{}", self.board.to_ascii());
            println!("Fen: {}", self.board.to_fen());
        }
        if self.check_game_over() {
            self.game_over = true;
        }
    }

    fn report(&self) -> SearchReport {
        SearchReport {
            show_pv: self.session.show_pv,
            xboard: self.session.protocol == Protocol::Xboard,
        }
    }

    /// Run one search over the game position. Returns the score (signed
    /// for White), the move, and the command type that ended the search.
    fn run_search(&mut self, max_depth: i32, deadlines: Deadlines) -> (i32, Move, CmdType) {
        let report = self.report();
        let debug = self.session.debug;
        let mut poller = SearchPoller {
            input: &mut self.input,
            session: &mut self.session,
        };
        let mut searcher = Searcher::new(
            &self.board,
            &mut self.tt,
            &mut self.eval,
            &self.egbb,
            &mut poller,
            report,
        );
        let score = searcher.id_search(max_depth, Move::NULL, deadlines);
        if debug {
            let elapsed = searcher.sd.t_start.elapsed();
            println!("{}", searcher.sd.summary(elapsed));
        }
        (score, searcher.sd.mv, searcher.sd.cmd_type)
    }

    /// Choose the engine's move, by book or by search, and play it.
    fn cpu_move(&mut self) {
        let mut book_used = false;
        let mut score = 0;
        let mut mv = Move::NULL;

        if self.book.mode() != BookMode::Off {
            if let Some(book_mv) = self.book.pick_move(&mut self.board) {
                mv = book_mv;
            }
        }

        if !mv.is_null() {
            book_used = true;
            self.in_book = true;
        } else {
            let params = TimeParams {
                analyze: false,
                tc_end: self.session.tc_end,
                nmoves_per_tc: self.nmoves_per_tc,
                increment_ms: self.increment_ms,
                in_book: self.in_book,
                game_ply: self.board.ply(),
            };
            let deadlines = allocate_time(&params, Instant::now());
            let (val, best, cmd_type) = self.run_search(self.max_depth, deadlines);
            if cmd_type == CmdType::Cancel {
                self.cpu_color = None;
                return;
            }
            score = val;
            mv = best;
            self.in_book = false;
        }

        if mv.is_null() {
            // No legal moves can only mean the game ended under us.
            self.game_over = true;
            return;
        }

        // Hopeless positions are resigned rather than dragged out.
        if self.board.side_to_move().sign() * score < VAL_RESIGN {
            if self.board.side_to_move() == Color::White {
                println!("0-1 {{White resigns}}");
            } else {
                println!("1-0 {{Black resigns}}");
            }
            self.game_over = true;
            return;
        }

        println!("move {}", mv.to_coord());
        if self.session.debug && !book_used {
            println!("Score: {score}");
        }

        let san = self.board.move_to_san(mv);
        let mover = self.board.side_to_move();
        self.gamelog.update(
            mover,
            self.board.ply(),
            &san,
            Some(mover.sign() * score),
            book_used,
        );
        self.update_game(mv);
    }

    /// Infinite search mode: keep searching the current position, process
    /// position changes as they come, leave on "exit".
    fn analyze_mode(&mut self) -> i32 {
        self.cpu_color = None;
        let mut cmd_type = CmdType::Continue;
        while self.session.analyze {
            if !self.game_over && cmd_type != CmdType::Cancel {
                let (_, _, end) = self.run_search(self.max_depth, Deadlines::unlimited());
                cmd_type = end;
                // With the depth limit reached there is nothing new to
                // learn until the position changes.
                if cmd_type == CmdType::Continue {
                    cmd_type = CmdType::Cancel;
                }
            } else {
                if self.read_input() != 0 {
                    return -1;
                }
                cmd_type = CmdType::Continue;
            }
        }
        0
    }

    /// The main loop: move when it is the engine's turn, else serve input.
    pub fn main_loop(&mut self) {
        loop {
            if Some(self.board.side_to_move()) == self.cpu_color && !self.game_over {
                self.cpu_move();
            } else if self.read_input() != 0 {
                break;
            }
        }
    }

    /// Read and execute one command line. Nonzero means quit.
    fn read_input(&mut self) -> i32 {
        if self.session.protocol == Protocol::Native && self.input.pending.is_empty() {
            print!(
                "{}: ",
                if self.board.side_to_move() == Color::White {
                    "White"
                } else {
                    "Black"
                }
            );
            let _ = std::io::stdout().flush();
        }
        let Some(line) = self.input.read_line() else {
            return -1;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            return 0;
        }
        self.exec_line(&line)
    }

    fn exec_line(&mut self, line: &str) -> i32 {
        if self.session.protocol == Protocol::Xboard || self.session.analyze {
            return self.exec_xboard(line);
        }
        self.exec_native(line)
    }

    fn exec_native(&mut self, line: &str) -> i32 {
        let cmd = first_word(line);
        let args = rest_of(line);
        match cmd {
            "xboard" => {
                self.session.protocol = Protocol::Xboard;
                println!();
            }
            "quit" => return -1,
            "debug" => {
                self.session.debug = !self.session.debug;
                println!(
                    "Debugging mode {}",
                    if self.session.debug { "ON" } else { "OFF" }
                );
            }
            "printboard" => {
                print!("{}", self.board.to_ascii());
                println!("Fen: {}", self.board.to_fen());
            }
            "printeval" => println!("eval: {}", self.eval.eval(&self.board)),
            "printmat" => {
                println!(
                    "material: White {}, Black {}",
                    self.board.material(Color::White),
                    self.board.material(Color::Black)
                );
                println!("Max phase: {MAX_PHASE}");
                println!("Phase: {}", self.board.phase());
            }
            "printkey" => println!("Hash key: {}", self.board.key()),
            "printmoves" => {
                let list = self.board.generate_moves();
                for mv in list.iter().copied() {
                    println!("{}", self.board.move_to_san(mv));
                }
                println!("{} legal moves", list.len());
            }
            "perft" | "divide" => self.exec_perft(args, cmd == "divide"),
            "help" => print_help(),
            _ => return self.exec_xboard(line),
        }
        0
    }

    fn exec_perft(&mut self, args: &str, divide: bool) {
        let Ok(depth) = args.parse::<i32>() else {
            println!("A depth parameter for perft is needed");
            return;
        };
        if depth < 1 {
            println!("Depth is too small: {depth} (minimum 1)");
            return;
        }
        let timer = Instant::now();
        let nnodes = perft_root(&self.board, depth, self.settings.thread_count(), divide);
        let elapsed = timer.elapsed().as_secs_f64();
        println!("Perft({depth}): {nnodes} nodes.");
        println!("Time: {elapsed:.2} seconds.");
        println!(
            "Processing speed: {:.0} nodes per second.",
            nnodes as f64 / elapsed.max(0.001)
        );
    }

    #[allow(clippy::too_many_lines)]
    fn exec_xboard(&mut self, line: &str) -> i32 {
        let cmd = first_word(line);
        let args = rest_of(line);

        if !is_known_xb_command(line, self.session.analyze) {
            return self.exec_move_or_unknown(cmd);
        }

        match cmd {
            "xboard" => {
                self.session.protocol = Protocol::Native;
                println!("Xboard mode disabled.");
            }
            "protover" => {
                if args.parse::<u32>().unwrap_or(0) < 2 {
                    self.session.protocol = Protocol::Native;
                    println!("Xboard protocol 2 or newer is needed.");
                } else {
                    println!("{}", feature_string(APP_NAME, APP_VERSION));
                }
            }
            "accepted" | "rejected" | "computer" | "otim" | "?" => {}
            "new" => {
                self.new_game(START_FEN, Some(Color::Black));
                self.max_depth = MAX_PLY as i32 - 1;
            }
            "quit" => return -1,
            "force" => self.cpu_color = None,
            "go" => self.cpu_color = Some(self.board.side_to_move()),
            "playother" => self.cpu_color = Some(self.board.side_to_move().opponent()),
            "level" => match parse_level(args) {
                Some((moves, _time_ms, inc_ms)) => {
                    self.nmoves_per_tc = moves;
                    self.increment_ms = inc_ms;
                }
                None => println!("Error (bad level arguments): {args}"),
            },
            "st" => {
                let st_ms = (args.parse::<u64>().unwrap_or(0) * 1000).saturating_sub(200);
                self.nmoves_per_tc = 0;
                self.session.tc_end = None;
                self.increment_ms = st_ms;
            }
            "sd" => {
                if let Ok(depth) = args.parse::<i32>() {
                    if depth > 0 {
                        self.max_depth = depth.min(MAX_PLY as i32 - 1);
                    }
                }
            }
            "time" => {
                let centis: i64 = args.parse().unwrap_or(0);
                self.session.tc_end = if centis > 0 {
                    Some(Instant::now() + Duration::from_millis(centis as u64 * 10))
                } else {
                    None
                };
            }
            "ping" => println!("pong {args}"),
            "result" => self.exec_result(first_word(args)),
            "setboard" => {
                if args.is_empty() {
                    println!("A valid FEN string is needed.");
                } else {
                    self.new_game(args, None);
                }
            }
            "hint" => self.exec_hint(),
            "bk" => self.exec_bk(),
            "undo" => {
                if self.board.ply() > 0 {
                    self.board.undo_move();
                    self.game_over = false;
                }
            }
            "remove" => {
                if self.board.ply() > 1 {
                    self.board.undo_move();
                    self.board.undo_move();
                    self.game_over = false;
                }
            }
            "post" => self.session.show_pv = true,
            "nopost" => self.session.show_pv = false,
            "analyze" => {
                self.session.analyze = true;
                if self.analyze_mode() != 0 {
                    return -1;
                }
            }
            "exit" => self.session.analyze = false,
            "." => println!("stat01: 0 0 0 0 0"),
            "name" => self.session.op_name = args.to_string(),
            "memory" => {
                let mb = args.parse::<usize>().unwrap_or(0);
                if !(8..=1024).contains(&mb) {
                    println!("Hash size must be between 8 and 1024 MB.");
                } else {
                    match TranspositionTable::new(mb) {
                        Ok(tt) => self.tt = tt,
                        Err(err) => self.fatal(&format!("{err} ({mb} MB)")),
                    }
                }
            }
            _ => return self.exec_move_or_unknown(cmd),
        }
        0
    }

    fn exec_move_or_unknown(&mut self, word: &str) -> i32 {
        match self.board.parse_move(word) {
            Err(MoveParseError::Malformed) => {
                println!("Error (unknown command): {word}");
            }
            _ if self.game_over => {
                println!("Error (the game is over, move rejected)");
            }
            Err(MoveParseError::Illegal) => {
                println!("Illegal move: {word}");
            }
            Ok(mv) => {
                let san = self.board.move_to_san(mv);
                let mover = self.board.side_to_move();
                self.gamelog.update(mover, self.board.ply(), &san, None, false);
                self.update_game(mv);
            }
        }
        0
    }

    /// Game over, per the GUI. Book learning runs only off lost games,
    /// which keeps the book's win counts honest.
    fn exec_result(&mut self, result: &str) {
        self.game_over = true;
        let winner = match result {
            "1-0" => Some(Color::White),
            "0-1" => Some(Color::Black),
            _ => None,
        };
        if let (Some(winner), Some(cpu)) = (winner, self.cpu_color) {
            if winner == cpu.opponent() && self.settings.use_learning {
                self.book.learn_game(&self.board, winner);
            }
        }
    }

    /// Best book move if any, otherwise the hash table's suggestion.
    fn exec_hint(&mut self) {
        let mut mv = Move::NULL;
        if self.book.mode() != BookMode::Off {
            if let Some(book_mv) = self.book.pick_move(&mut self.board) {
                mv = book_mv;
            }
        }
        if mv.is_null() {
            mv = self.tt.hash_move(self.board.key());
            if !mv.is_null() && !self.board.generate_moves().contains(mv) {
                mv = Move::NULL;
            }
        }
        if !mv.is_null() {
            let san = self.board.move_to_san(mv);
            println!("Hint: {san}");
        }
    }

    /// List the book's moves for the current position.
    fn exec_bk(&mut self) {
        if self.book.mode() == BookMode::Off {
            println!("Opening book is disabled");
            return;
        }
        let moves = self.book.list_moves(&mut self.board);
        let tot_score: i32 = moves.iter().filter_map(|bm| bm.score).sum();
        if tot_score <= 0 {
            println!("There are no book moves for the current position");
            return;
        }
        print!("0 0 0 0 (");
        let mut nmoves = 0;
        for bm in &moves {
            let Some(score) = bm.score else { continue };
            let percent = (f64::from(score) / f64::from(tot_score)) * 100.0;
            if percent < 1.0 {
                continue;
            }
            if nmoves > 0 {
                print!(", ");
            }
            nmoves += 1;
            let san = self.board.move_to_san(bm.mv);
            print!("{san} {percent:.0}%");
        }
        println!(")");
    }

    /// Unrecoverable error: log, leave an aborted mark, exit nonzero.
    fn fatal(&self, msg: &str) -> ! {
        error!("{msg}");
        log_error_line(self.gamelog.enabled(), "aborted");
        eprintln!("Aborted.");
        std::process::exit(1);
    }

    #[cfg(test)]
    pub(crate) fn board(&self) -> &Board {
        &self.board
    }
}

fn print_help() {
    println!(
        "Accepted commands:\n\n\
         debug - toggles debugging mode\n\
         divide [depth] - perft with a node count for each root move\n\
         help - shows this list\n\
         perft [depth] - runs the perft test [depth] plies deep\n\
         printboard - prints an ASCII chess board and the FEN string\n\
         printeval - prints the static evaluation\n\
         printkey - prints the hash key\n\
         printmat - prints the material each player has on the board\n\
         printmoves - prints a list of legal moves\n\
         quit - quits the program\n\
         xboard - switches to Xboard/Winboard mode\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> Engine {
        let settings = Settings {
            hash_mb: 8,
            book_mode: BookMode::Off,
            ..Settings::default()
        };
        let mut engine = Engine::new(settings).unwrap();
        engine.cpu_color = None;
        engine
    }

    #[test]
    fn plays_opponent_moves() {
        let mut engine = test_engine();
        assert_eq!(engine.exec_line("e2e4"), 0);
        assert_eq!(engine.board().ply(), 1);
        assert_eq!(engine.board().side_to_move(), Color::Black);
    }

    #[test]
    fn rejects_illegal_moves() {
        let mut engine = test_engine();
        assert_eq!(engine.exec_line("e2e5"), 0);
        assert_eq!(engine.board().ply(), 0);
        assert_eq!(engine.exec_line("frobnicate"), 0);
        assert_eq!(engine.board().ply(), 0);
    }

    #[test]
    fn setboard_loads_positions() {
        let mut engine = test_engine();
        engine.session.protocol = Protocol::Xboard;
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(engine.exec_line(&format!("setboard {fen}")), 0);
        assert_eq!(engine.board().to_fen(), fen);
        // A bad FEN leaves the position alone.
        assert_eq!(engine.exec_line("setboard garbage"), 0);
        assert_eq!(engine.board().to_fen(), fen);
    }

    #[test]
    fn undo_and_remove() {
        let mut engine = test_engine();
        engine.exec_line("e2e4");
        engine.exec_line("e7e5");
        engine.session.protocol = Protocol::Xboard;
        engine.exec_line("undo");
        assert_eq!(engine.board().ply(), 1);
        engine.exec_line("e7e5");
        engine.exec_line("remove");
        assert_eq!(engine.board().ply(), 0);
    }

    #[test]
    fn quit_returns_nonzero() {
        let mut engine = test_engine();
        assert_eq!(engine.exec_line("quit"), -1);
    }

    #[test]
    fn force_and_go_set_sides() {
        let mut engine = test_engine();
        engine.session.protocol = Protocol::Xboard;
        engine.exec_line("force");
        assert_eq!(engine.cpu_color, None);
        engine.exec_line("go");
        assert_eq!(engine.cpu_color, Some(Color::White));
        engine.exec_line("playother");
        assert_eq!(engine.cpu_color, Some(Color::Black));
    }

    #[test]
    fn memory_command_bounds() {
        let mut engine = test_engine();
        engine.session.protocol = Protocol::Xboard;
        engine.exec_line("memory 4"); // too small, rejected with a message
        engine.exec_line("memory 2048"); // too large
        engine.exec_line("memory 8"); // accepted
    }

    #[test]
    fn game_over_detection() {
        // Fool's mate: the last move ends the game.
        let mut engine = test_engine();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            engine.exec_line(mv);
        }
        assert!(engine.game_over);
        // Further moves are rejected.
        engine.exec_line("e2e4");
        assert_eq!(engine.board().ply(), 4);
    }
}

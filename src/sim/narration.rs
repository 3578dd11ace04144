/// Paged text shown over the scene: intro, help, credits and the stats
/// screen. Pages are built once when the narration opens, so stats show
/// a snapshot of the player at that moment.

use crate::domain::player::{Achievement, Player};
use crate::domain::rules::format_time;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NarrationKind {
    Intro,
    Controls,
    About,
    Stats,
}

const INTRO: [&str; 4] = [
    "You have fallen into a vast network of mazes. Each maze has an exit...",
    "...but each exit leads down to yet another, deeper level of the labyrinth.",
    "Will you ever escape, or are you doomed to roam these halls to the end of your days?",
    "You do not know, but here you are, brave explorer, and you must try!",
];

const CONTROLS: [&str; 3] = [
    "Move:\n  Up / W forward\n  Down / S back\nTurn:\n  Left / A / Q\n  Right / D / E",
    "Menu:\n  M or Tab\nSelect:\n  Enter or Space\nBack:\n  Esc",
    "The clock stops while a menu is open or the window loses focus.",
];

const ABOUT: [&str; 2] = [
    "MazeCrawler\n\nA first-person maze explorer for the terminal.",
    "Each maze is carved at random. Find the exit to descend one level deeper.",
];

/// Shown, one chosen at random, after each completed maze.
pub const EXCLAMATIONS: [&str; 30] = [
    "A-maze-ing!",
    "Awesome!",
    "Brilliant!",
    "Congrats!",
    "Excellent!",
    "Fantastic!",
    "Good job!",
    "Great work!",
    "Groovy!",
    "Huzzah!",
    "Hurrah!",
    "Hooray!",
    "Impressive!",
    "Magnificent!",
    "Marvelous!",
    "Outstanding!",
    "Peachy!",
    "Phenomenal!",
    "Spectacular!",
    "Splendid!",
    "Stellar!",
    "Stupendous!",
    "Superb!",
    "Terrific!",
    "Well done!",
    "Wahoo!",
    "Whoopee!",
    "Wonderful!",
    "Wowzers!",
    "Yippee!",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narration {
    pub kind: NarrationKind,
    pages: Vec<String>,
    page: usize,
}

impl Narration {
    pub fn new(kind: NarrationKind, player: &Player) -> Self {
        let pages = match kind {
            NarrationKind::Intro => INTRO.iter().map(|s| s.to_string()).collect(),
            NarrationKind::Controls => CONTROLS.iter().map(|s| s.to_string()).collect(),
            NarrationKind::About => ABOUT.iter().map(|s| s.to_string()).collect(),
            NarrationKind::Stats => stats_pages(player),
        };
        Narration { kind, pages, page: 0 }
    }

    pub fn text(&self) -> &str {
        self.pages.get(self.page).map(String::as_str).unwrap_or("")
    }

    #[inline]
    pub fn page(&self) -> usize {
        self.page
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Move to the next page. Returns false when already on the last one.
    pub fn advance(&mut self) -> bool {
        if self.page + 1 < self.pages.len() {
            self.page += 1;
            true
        } else {
            false
        }
    }
}

fn stats_pages(player: &Player) -> Vec<String> {
    let best = if player.has_best_time() {
        format_time(u32::from(player.best_time))
    } else {
        "--:--".to_string()
    };
    let mut pages = vec![format!(
        "Mazes Completed:\n  {}\nBest Time:\n  {}\nPoints:\n  {}",
        player.mazes_completed(), best, player.points
    )];
    pages.extend(
        Achievement::ALL
            .iter()
            .filter(|a| player.achievements.contains(**a))
            .map(|a| format!("Achievements:\n  \"{}\": {}", a.name(), a.description())),
    );
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_has_four_pages_and_stops_at_the_last() {
        let mut n = Narration::new(NarrationKind::Intro, &Player::new());
        assert_eq!(n.page_count(), 4);
        assert!(n.text().starts_with("You have fallen"));
        assert!(n.advance());
        assert!(n.advance());
        assert!(n.advance());
        assert!(!n.advance());
        assert_eq!(n.page(), 3);
    }

    #[test]
    fn fresh_stats_hide_best_time() {
        let n = Narration::new(NarrationKind::Stats, &Player::new());
        assert_eq!(n.page_count(), 1);
        assert_eq!(n.text(), "Mazes Completed:\n  0\nBest Time:\n  --:--\nPoints:\n  0");
    }

    #[test]
    fn stats_list_one_page_per_achievement() {
        let mut p = Player::new();
        p.level = 3;
        p.best_time = 75;
        p.points = 42;
        p.achievements.unlock(Achievement::Speedy);
        p.achievements.unlock(Achievement::Novice);
        let mut n = Narration::new(NarrationKind::Stats, &p);
        assert_eq!(n.page_count(), 3);
        assert!(n.text().contains("  2\n"));
        assert!(n.text().contains("01:15"));
        assert!(n.advance());
        assert!(n.text().contains("\"Speedy\""));
        assert!(n.advance());
        assert!(n.text().contains("\"Novice\""));
    }

    #[test]
    fn exclamations_are_distinct() {
        let mut v = EXCLAMATIONS.to_vec();
        v.sort_unstable();
        v.dedup();
        assert_eq!(v.len(), EXCLAMATIONS.len());
    }
}

// Raffle Draw Engine - Exports
use crate::constants::DEFAULT_DELIMITER;
use crate::prize::{prize_for, PrizeConfig};
use crate::state::DrawSession;
use crate::utils::escape_field;

const HEADER: [&str; 6] = ["position", "name", "email", "entries", "bonus", "prize"];

/// Winners table as delimited text, one row per winner in draw order.
pub fn winners_table(session: &DrawSession, prizes: Option<&PrizeConfig>, delimiter: char) -> String {
    let separator = delimiter.to_string();
    let mut out = HEADER.join(separator.as_str());
    out.push('\n');

    for winner in &session.winners {
        let prize = prize_for(prizes, winner.position as usize - 1)
            .map(|p| p.name.as_str())
            .unwrap_or("");
        let row = [
            winner.position.to_string(),
            escape_field(&winner.participant.name, delimiter),
            escape_field(&winner.participant.email, delimiter),
            winner.participant.entries.to_string(),
            if winner.is_bonus { "yes" } else { "no" }.to_string(),
            escape_field(prize, delimiter),
        ];
        out.push_str(&row.join(separator.as_str()));
        out.push('\n');
    }
    out
}

/// Comma-separated winners table
pub fn winners_csv(session: &DrawSession, prizes: Option<&PrizeConfig>) -> String {
    winners_table(session, prizes, DEFAULT_DELIMITER)
}

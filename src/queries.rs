//! Analytical query catalog over the three partition tables.
//!
//! Each entry is plain SQLite SQL. Most queries first concatenate the
//! partitions with `UNION ALL`; per-team figures unpivot `team1`/`team2` into
//! one row per team. Empty fields are stored as NULL, so `IS NOT NULL`
//! filters skip both missing data and no-result matches.

use rusqlite::Connection;
use tracing::{error, info};

use crate::db::{self, ResultTable};
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy)]
pub struct QuerySpec {
    pub id: u8,
    pub title: &'static str,
    pub sql: &'static str,
}

pub static CATALOG: [QuerySpec; 20] = [
    QuerySpec {
        id: 1,
        title: "Total matches by format",
        sql: "
        SELECT match_type, COUNT(*) AS matches
        FROM (
            SELECT match_type FROM test_matches
            UNION ALL SELECT match_type FROM odi_matches
            UNION ALL SELECT match_type FROM t20_matches
        )
        GROUP BY match_type
        ORDER BY matches DESC",
    },
    QuerySpec {
        id: 2,
        title: "Matches per year across all formats",
        sql: "
        SELECT SUBSTR(date, 1, 4) AS year, COUNT(*) AS matches
        FROM (
            SELECT date FROM test_matches
            UNION ALL SELECT date FROM odi_matches
            UNION ALL SELECT date FROM t20_matches
        )
        WHERE date IS NOT NULL
        GROUP BY year
        ORDER BY year",
    },
    QuerySpec {
        id: 3,
        title: "Teams with most matches played",
        sql: "
        SELECT team, COUNT(*) AS matches_played
        FROM (
            SELECT team1 AS team FROM test_matches
            UNION ALL SELECT team2 FROM test_matches
            UNION ALL SELECT team1 FROM odi_matches
            UNION ALL SELECT team2 FROM odi_matches
            UNION ALL SELECT team1 FROM t20_matches
            UNION ALL SELECT team2 FROM t20_matches
        )
        GROUP BY team
        ORDER BY matches_played DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 4,
        title: "Top 5 winning teams overall",
        sql: "
        SELECT winner, COUNT(*) AS wins
        FROM (
            SELECT winner FROM test_matches WHERE winner IS NOT NULL
            UNION ALL SELECT winner FROM odi_matches WHERE winner IS NOT NULL
            UNION ALL SELECT winner FROM t20_matches WHERE winner IS NOT NULL
        )
        GROUP BY winner
        ORDER BY wins DESC
        LIMIT 5",
    },
    QuerySpec {
        id: 5,
        title: "Win percentage by team (min 20 matches)",
        sql: "
        WITH team_matches AS (
            SELECT team,
                   COUNT(*) AS total_matches,
                   SUM(CASE WHEN winner = team THEN 1 ELSE 0 END) AS wins
            FROM (
                SELECT team1 AS team, winner FROM test_matches
                UNION ALL SELECT team2, winner FROM test_matches
                UNION ALL SELECT team1, winner FROM odi_matches
                UNION ALL SELECT team2, winner FROM odi_matches
                UNION ALL SELECT team1, winner FROM t20_matches
                UNION ALL SELECT team2, winner FROM t20_matches
            )
            GROUP BY team
            HAVING total_matches >= 20
        )
        SELECT team,
               total_matches,
               wins,
               ROUND(wins * 100.0 / total_matches, 2) AS win_percentage
        FROM team_matches
        ORDER BY win_percentage DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 6,
        title: "Team performance by match format",
        sql: "
        SELECT team,
               SUM(CASE WHEN format = 'test' THEN wins ELSE 0 END) AS test_wins,
               SUM(CASE WHEN format = 'odi' THEN wins ELSE 0 END) AS odi_wins,
               SUM(CASE WHEN format = 't20' THEN wins ELSE 0 END) AS t20_wins
        FROM (
            SELECT 'test' AS format, winner AS team, COUNT(*) AS wins
            FROM test_matches WHERE winner IS NOT NULL GROUP BY winner
            UNION ALL
            SELECT 'odi', winner, COUNT(*) FROM odi_matches WHERE winner IS NOT NULL GROUP BY winner
            UNION ALL
            SELECT 't20', winner, COUNT(*) FROM t20_matches WHERE winner IS NOT NULL GROUP BY winner
        )
        GROUP BY team
        ORDER BY (test_wins + odi_wins + t20_wins) DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 7,
        title: "Head-to-head records between top teams",
        sql: "
        WITH top_teams AS (
            SELECT winner FROM (
                SELECT winner, COUNT(*) AS wins FROM (
                    SELECT winner FROM test_matches WHERE winner IS NOT NULL
                    UNION ALL SELECT winner FROM odi_matches WHERE winner IS NOT NULL
                    UNION ALL SELECT winner FROM t20_matches WHERE winner IS NOT NULL
                )
                GROUP BY winner
                ORDER BY wins DESC
                LIMIT 5
            )
        )
        SELECT t1.team1,
               t1.team2,
               COUNT(*) AS total_matches,
               SUM(CASE WHEN t1.winner = t1.team1 THEN 1 ELSE 0 END) AS team1_wins,
               SUM(CASE WHEN t1.winner = t1.team2 THEN 1 ELSE 0 END) AS team2_wins,
               SUM(CASE WHEN t1.winner IS NULL THEN 1 ELSE 0 END) AS draws_or_ties
        FROM (
            SELECT team1, team2, winner FROM test_matches
            UNION ALL SELECT team1, team2, winner FROM odi_matches
            UNION ALL SELECT team1, team2, winner FROM t20_matches
        ) t1
        WHERE t1.team1 IN (SELECT winner FROM top_teams)
          AND t1.team2 IN (SELECT winner FROM top_teams)
        GROUP BY t1.team1, t1.team2
        HAVING total_matches >= 5
        ORDER BY total_matches DESC",
    },
    QuerySpec {
        id: 8,
        title: "Toss decision frequency by format",
        sql: "
        SELECT match_type, toss_decision, COUNT(*) AS count
        FROM (
            SELECT match_type, toss_decision FROM test_matches
            UNION ALL SELECT match_type, toss_decision FROM odi_matches
            UNION ALL SELECT match_type, toss_decision FROM t20_matches
        )
        WHERE toss_decision IS NOT NULL
        GROUP BY match_type, toss_decision
        ORDER BY match_type, count DESC",
    },
    QuerySpec {
        id: 9,
        title: "Toss win vs match win correlation",
        sql: "
        SELECT match_type,
               COUNT(*) AS total_matches,
               SUM(CASE WHEN toss_winner = winner THEN 1 ELSE 0 END) AS toss_and_win,
               ROUND(SUM(CASE WHEN toss_winner = winner THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2)
                   AS percentage
        FROM (
            SELECT match_type, toss_winner, winner FROM test_matches
            UNION ALL SELECT match_type, toss_winner, winner FROM odi_matches
            UNION ALL SELECT match_type, toss_winner, winner FROM t20_matches
        )
        WHERE toss_winner IS NOT NULL AND winner IS NOT NULL
        GROUP BY match_type
        ORDER BY percentage DESC",
    },
    QuerySpec {
        id: 10,
        title: "Most successful teams when winning toss",
        // Denominator: every match where this team won the toss.
        sql: "
        SELECT m.winner,
               COUNT(*) AS wins_after_toss_win,
               ROUND(COUNT(*) * 100.0 / (
                   SELECT COUNT(*)
                   FROM (
                       SELECT toss_winner FROM test_matches
                       UNION ALL SELECT toss_winner FROM odi_matches
                       UNION ALL SELECT toss_winner FROM t20_matches
                   ) t
                   WHERE t.toss_winner = m.winner
               ), 2) AS win_percentage_when_toss_winner
        FROM (
            SELECT winner FROM test_matches WHERE toss_winner = winner
            UNION ALL SELECT winner FROM odi_matches WHERE toss_winner = winner
            UNION ALL SELECT winner FROM t20_matches WHERE toss_winner = winner
        ) m
        GROUP BY m.winner
        HAVING wins_after_toss_win >= 10
        ORDER BY win_percentage_when_toss_winner DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 11,
        title: "Top 10 most used venues",
        sql: "
        SELECT venue, COUNT(*) AS matches_hosted
        FROM (
            SELECT venue FROM test_matches
            UNION ALL SELECT venue FROM odi_matches
            UNION ALL SELECT venue FROM t20_matches
        )
        WHERE venue IS NOT NULL
        GROUP BY venue
        ORDER BY matches_hosted DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 12,
        title: "Venues with highest home advantage",
        sql: "
        WITH venue_teams AS (
            SELECT venue, city, team1 AS team,
                   COUNT(*) AS total_matches,
                   SUM(CASE WHEN winner = team1 THEN 1 ELSE 0 END) AS wins
            FROM (
                SELECT venue, city, team1, winner FROM test_matches
                UNION ALL SELECT venue, city, team1, winner FROM odi_matches
                UNION ALL SELECT venue, city, team1, winner FROM t20_matches
            )
            GROUP BY venue, city, team1

            UNION ALL

            SELECT venue, city, team2 AS team,
                   COUNT(*) AS total_matches,
                   SUM(CASE WHEN winner = team2 THEN 1 ELSE 0 END) AS wins
            FROM (
                SELECT venue, city, team2, winner FROM test_matches
                UNION ALL SELECT venue, city, team2, winner FROM odi_matches
                UNION ALL SELECT venue, city, team2, winner FROM t20_matches
            )
            GROUP BY venue, city, team2
        )
        SELECT venue, city, team, total_matches, wins,
               ROUND(wins * 100.0 / total_matches, 2) AS win_percentage
        FROM venue_teams
        WHERE total_matches >= 10
        ORDER BY win_percentage DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 13,
        title: "Cities hosting most matches",
        sql: "
        SELECT city, COUNT(*) AS matches_hosted
        FROM (
            SELECT city FROM test_matches
            UNION ALL SELECT city FROM odi_matches
            UNION ALL SELECT city FROM t20_matches
        )
        WHERE city IS NOT NULL
        GROUP BY city
        ORDER BY matches_hosted DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 14,
        title: "Matches per month (seasonality)",
        sql: "
        SELECT CASE
                   WHEN SUBSTR(date, 6, 2) IN ('12', '01', '02') THEN 'Winter'
                   WHEN SUBSTR(date, 6, 2) IN ('03', '04', '05') THEN 'Spring'
                   WHEN SUBSTR(date, 6, 2) IN ('06', '07', '08') THEN 'Summer'
                   WHEN SUBSTR(date, 6, 2) IN ('09', '10', '11') THEN 'Fall'
                   ELSE 'Unknown'
               END AS season,
               COUNT(*) AS matches
        FROM (
            SELECT date FROM test_matches
            UNION ALL SELECT date FROM odi_matches
            UNION ALL SELECT date FROM t20_matches
        )
        WHERE date IS NOT NULL
        GROUP BY season
        ORDER BY matches DESC",
    },
    QuerySpec {
        id: 15,
        title: "Team performance by decade",
        // Year bound is a string comparison on the zero-padded year prefix.
        sql: "
        SELECT team,
               SUBSTR(year, 1, 3) || '0s' AS decade,
               COUNT(*) AS matches,
               SUM(CASE WHEN winner = team THEN 1 ELSE 0 END) AS wins,
               ROUND(SUM(CASE WHEN winner = team THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2)
                   AS win_percentage
        FROM (
            SELECT team1 AS team, winner, SUBSTR(date, 1, 4) AS year FROM test_matches
            UNION ALL SELECT team2, winner, SUBSTR(date, 1, 4) FROM test_matches
            UNION ALL SELECT team1, winner, SUBSTR(date, 1, 4) FROM odi_matches
            UNION ALL SELECT team2, winner, SUBSTR(date, 1, 4) FROM odi_matches
            UNION ALL SELECT team1, winner, SUBSTR(date, 1, 4) FROM t20_matches
            UNION ALL SELECT team2, winner, SUBSTR(date, 1, 4) FROM t20_matches
        )
        WHERE year IS NOT NULL AND year >= '1970'
        GROUP BY team, decade
        HAVING matches >= 20
        ORDER BY decade, win_percentage DESC",
    },
    QuerySpec {
        id: 16,
        title: "Test match results over time",
        sql: "
        SELECT SUBSTR(date, 1, 4) AS year,
               COUNT(*) AS test_matches,
               SUM(CASE WHEN winner = team1 THEN 1 ELSE 0 END) AS team1_wins,
               SUM(CASE WHEN winner = team2 THEN 1 ELSE 0 END) AS team2_wins,
               SUM(CASE WHEN winner IS NULL THEN 1 ELSE 0 END) AS draws
        FROM test_matches
        WHERE date IS NOT NULL
        GROUP BY year
        HAVING test_matches >= 5
        ORDER BY year",
    },
    QuerySpec {
        id: 17,
        title: "T20 match winners analysis",
        sql: "
        SELECT winner,
               COUNT(*) AS t20_wins,
               ROUND(COUNT(*) * 100.0 / (
                   SELECT COUNT(*) FROM t20_matches WHERE winner IS NOT NULL
               ), 2) AS percentage_of_total_wins
        FROM t20_matches
        WHERE winner IS NOT NULL
        GROUP BY winner
        HAVING COUNT(*) >= 10
        ORDER BY t20_wins DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 18,
        title: "ODI match winners analysis",
        sql: "
        SELECT winner,
               COUNT(*) AS odi_wins,
               ROUND(COUNT(*) * 100.0 / (
                   SELECT COUNT(*) FROM odi_matches WHERE winner IS NOT NULL
               ), 2) AS percentage_of_total_wins
        FROM odi_matches
        WHERE winner IS NOT NULL
        GROUP BY winner
        HAVING COUNT(*) >= 20
        ORDER BY odi_wins DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 19,
        title: "Teams with best win rate when losing toss",
        // Denominator: every match this team played where the other side won the toss.
        sql: "
        SELECT m.winner,
               COUNT(*) AS wins_without_toss,
               ROUND(COUNT(*) * 100.0 / (
                   SELECT COUNT(*)
                   FROM (
                       SELECT team1 AS team, toss_winner FROM test_matches
                       UNION ALL SELECT team2, toss_winner FROM test_matches
                       UNION ALL SELECT team1, toss_winner FROM odi_matches
                       UNION ALL SELECT team2, toss_winner FROM odi_matches
                       UNION ALL SELECT team1, toss_winner FROM t20_matches
                       UNION ALL SELECT team2, toss_winner FROM t20_matches
                   ) t
                   WHERE t.team = m.winner AND t.toss_winner != t.team
               ), 2) AS win_percentage_when_losing_toss
        FROM (
            SELECT winner FROM test_matches WHERE toss_winner != winner
            UNION ALL SELECT winner FROM odi_matches WHERE toss_winner != winner
            UNION ALL SELECT winner FROM t20_matches WHERE toss_winner != winner
        ) m
        GROUP BY m.winner
        HAVING wins_without_toss >= 10
        ORDER BY win_percentage_when_losing_toss DESC
        LIMIT 10",
    },
    QuerySpec {
        id: 20,
        title: "Most consistent venues (hosting multiple formats)",
        sql: "
        SELECT venue,
               COUNT(DISTINCT match_type) AS formats_hosted,
               GROUP_CONCAT(DISTINCT match_type) AS format_list
        FROM (
            SELECT venue, 'test' AS match_type FROM test_matches
            UNION SELECT venue, 'odi' FROM odi_matches
            UNION SELECT venue, 't20' FROM t20_matches
        )
        WHERE venue IS NOT NULL
        GROUP BY venue
        HAVING COUNT(DISTINCT match_type) > 1
        ORDER BY formats_hosted DESC, venue",
    },
];

pub fn find(id: u8) -> Option<&'static QuerySpec> {
    CATALOG.iter().find(|q| q.id == id)
}

pub fn run(conn: &Connection, spec: &QuerySpec) -> Result<ResultTable, PipelineError> {
    db::run_sql(conn, spec.sql).map_err(|source| PipelineError::Query {
        id: spec.id,
        source,
    })
}

pub struct QueryOutcome {
    pub spec: QuerySpec,
    pub result: Result<ResultTable, PipelineError>,
}

#[derive(Default)]
pub struct BatchReport {
    pub outcomes: Vec<QueryOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &QueryOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Run every spec in order. A failing query is logged and recorded; the
/// rest still run.
pub fn run_batch(conn: &Connection, specs: &[QuerySpec]) -> BatchReport {
    let mut report = BatchReport::default();
    for spec in specs {
        let result = run(conn, spec);
        match &result {
            Ok(table) => info!(query_id = spec.id, rows = table.len(), "query ok"),
            Err(e) => error!(query_id = spec.id, error = %e, "query failed"),
        }
        report.outcomes.push(QueryOutcome {
            spec: *spec,
            result,
        });
    }
    report
}

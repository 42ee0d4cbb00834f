//! Plain-text rendering of fight reports

use crate::error::SimError;
use crate::special::effective_backstab_skill;
use crate::stats::{FightReport, HitStats, RangedFightReport, WeaponReport};

const MISSING: &str = "—";

/// Whole numbers print bare, anything else with two decimals
fn stat(value: Option<f64>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{v:.2}"),
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    part as f64 / whole as f64 * 100.0
}

fn hit_stat_lines(lines: &mut Vec<String>, w: &WeaponReport) {
    let s: Option<&HitStats> = w.hit_stats.as_ref();
    let max = s.map_or(w.max_damage as f64, |s| s.max as f64);
    lines.push(format!("  Max hit: {}", stat(Some(max))));
    lines.push(format!("  Min hit: {}", stat(s.map(|s| s.min as f64))));
    lines.push(format!("  Mean hit: {}", stat(s.map(|s| s.mean))));
    lines.push(format!("  Median hit: {}", stat(s.map(|s| s.median))));
    lines.push(format!("  Mode hit: {}", stat(s.map(|s| s.mode as f64))));
}

fn accuracy_line(lines: &mut Vec<String>, label: &str, w: &WeaponReport) {
    if let Some(acc) = w.accuracy() {
        lines.push(format!("  {label}: {acc:.1}%"));
    }
}

fn proc_lines(lines: &mut Vec<String>, w: &WeaponReport) {
    lines.push(format!("  Procs: {}", w.procs));
    if w.proc_damage_total > 0 {
        lines.push(format!("  Proc spell damage: {}", w.proc_damage_total));
    }
}

/// Render a melee report. Labels default to "Weapon 1" / "Weapon 2".
pub fn format_report(report: &FightReport, label1: Option<&str>, label2: Option<&str>) -> String {
    let duration = report.duration_sec;
    let mut lines = vec![
        "--- Combat Report ---".to_string(),
        format!("Duration: {duration} seconds"),
        format!("Calculated To Hit: {}", report.calculated_to_hit),
        format!("Offense skill (0–255, used in to-hit): {}", report.offense_skill),
        format!(
            "Offense rating (for damage): {}  (skill + STR + worn + spell)",
            report.offense_rating
        ),
        format!("Offense rating from stats (STR): {}", report.offense_rating_from_str),
        format!(
            "Displayed Attack: {}  ( (offense rating + toHit) * 1000 / 744 )",
            report.displayed_attack
        ),
        format!("Main hand damage bonus: {}", report.damage_bonus),
    ];
    if report.damage_bonus_total > 0 {
        lines.push(format!("Damage from bonus: {}", report.damage_bonus_total));
    }
    lines.push(format!("Critical hits: {}", report.crit_hits));
    lines.push(format!(
        "Net DPS from criticals (vs normal): {:.2}",
        report.crit_damage_gain as f64 / duration
    ));

    let w1 = &report.weapon1;
    lines.push(String::new());
    lines.push(label1.unwrap_or("Weapon 1").to_string());
    lines.push(format!("  Combat rounds: {}", w1.rounds));
    if w1.rounds > 0 {
        lines.push(format!(
            "  Single / Double / Triple (% of rounds): {:.1}% / {:.1}% / {:.1}%",
            percent(w1.single, w1.rounds),
            percent(w1.double, w1.rounds),
            percent(w1.triple, w1.rounds)
        ));
    }
    lines.push(format!("  Single attacks: {}", w1.single));
    lines.push(format!("  Double attacks: {}", w1.double));
    lines.push(format!("  Triple attacks: {}", w1.triple));
    lines.push(format!("  Swings: {}", w1.swings));
    lines.push(format!("  Hits: {}", w1.hits));
    accuracy_line(&mut lines, "Overall accuracy", w1);
    lines.push(format!("  Total damage: {}", w1.total_damage));
    hit_stat_lines(&mut lines, w1);
    proc_lines(&mut lines, w1);

    let w2 = &report.weapon2;
    if w2.swings > 0 {
        lines.push(String::new());
        lines.push(label2.unwrap_or("Weapon 2").to_string());
        lines.push(format!("  Combat rounds: {}", w2.rounds));
        if w2.rounds > 0 {
            lines.push(format!(
                "  Single / Double (% of rounds): {:.1}% / {:.1}%",
                percent(w2.single, w2.rounds),
                percent(w2.double, w2.rounds)
            ));
        }
        lines.push(format!("  Single attacks: {}", w2.single));
        lines.push(format!("  Double attacks: {}", w2.double));
        lines.push(format!("  Swings: {}", w2.swings));
        lines.push(format!("  Hits: {}", w2.hits));
        accuracy_line(&mut lines, "Overall accuracy", w2);
        lines.push(format!("  Total damage: {}", w2.total_damage));
        hit_stat_lines(&mut lines, w2);
        proc_lines(&mut lines, w2);
    }

    if let Some(special) = report.special.as_ref().filter(|s| s.attempts > 0) {
        let accuracy = percent(special.hits, special.attempts);
        lines.push(String::new());
        lines.push(special.name.clone());
        lines.push(format!("  Count: {}", special.hits));
        lines.push(format!("  Attempts: {}", special.attempts));
        lines.push(format!("  Accuracy: {accuracy:.1}%"));
        lines.push(format!("  Total damage: {}", special.total_damage));
        lines.push(format!("  Max hit: {}", special.max_damage));
        lines.push(format!("  DPS: {:.2}", special.total_damage as f64 / duration));
        if let Some(bs) = &special.backstab {
            lines.push(format!("  Double backstabs: {}", bs.double_backstabs));
            if bs.mod_percent != 0 {
                let effective = effective_backstab_skill(bs.skill, bs.mod_percent);
                lines.push(format!(
                    "  Effective backstab skill: {effective} (skill + {}% mod, cap 255)",
                    bs.mod_percent
                ));
            }
        }
    }

    if let Some(fw) = report.fistweaving.as_ref().filter(|fw| fw.rounds > 0) {
        let accuracy = percent(fw.hits, fw.swings);
        lines.push(String::new());
        lines.push("Fistweaving (9 dmg, no proc)".to_string());
        lines.push(format!("  Rounds: {}", fw.rounds));
        lines.push(format!("  Single / Double: {} / {}", fw.single, fw.double));
        lines.push(format!("  Swings: {}", fw.swings));
        lines.push(format!("  Hits: {}", fw.hits));
        lines.push(format!("  Accuracy: {accuracy:.1}%"));
        lines.push(format!("  Total damage: {}", fw.total_damage));
        lines.push(format!("  Max hit: {}", fw.max_damage));
        lines.push(format!("  DPS: {:.2}", fw.total_damage as f64 / duration));
    }

    if report.elemental_damage_total > 0 {
        lines.push(String::new());
        lines.push(format!("Elemental damage: {}", report.elemental_damage_total));
    }
    lines.push(String::new());
    lines.push(format!("Total damage: {}", report.total_damage));
    lines.push(format!("DPS: {:.2}", report.total_damage as f64 / duration));
    lines.join("\n")
}

/// Render a ranged report
pub fn format_ranged_report(report: &RangedFightReport) -> String {
    let duration = report.duration_sec;
    let r = &report.ranged;
    let mut lines = vec![
        "--- Ranged Combat Report ---".to_string(),
        format!("Duration: {duration} seconds"),
        format!("Calculated To Hit: {}", report.calculated_to_hit),
        format!("Offense rating (for damage): {}", report.offense_rating),
        format!(
            "Displayed Attack: {}  ( (offense rating + toHit) * 1000 / 744 )",
            report.displayed_attack
        ),
        String::new(),
        "Ranged".to_string(),
        format!("  Shots: {}", r.swings),
        format!("  Hits: {}", r.hits),
    ];
    accuracy_line(&mut lines, "Accuracy", r);
    lines.push(format!("  Total damage: {}", r.total_damage));
    lines.push(format!("  Max hit: {}", r.max_damage));
    lines.push(format!("  Min hit: {}", stat(r.min_damage.map(f64::from))));
    proc_lines(&mut lines, r);

    lines.push(String::new());
    lines.push(format!("Critical hits: {}", report.crit_hits));
    lines.push(format!(
        "Net DPS from criticals: {:.2}",
        report.crit_damage_gain as f64 / duration
    ));
    if let Some(lost) = report.wall_penalty_damage_lost {
        lines.push(format!("Damage lost to wall penalty: {lost}"));
    }
    if report.elemental_damage_total > 0 {
        lines.push(format!("Elemental damage: {}", report.elemental_damage_total));
    }
    lines.push(format!("Total damage: {}", report.total_damage));
    lines.push(format!("DPS: {:.2}", report.total_damage as f64 / duration));
    lines.join("\n")
}

/// Render a ranged run, or its input error in place of the report
pub fn format_ranged_result(result: &Result<RangedFightReport, SimError>) -> String {
    match result {
        Ok(report) => format_ranged_report(report),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{BackstabReport, SpecialReport};

    #[test]
    fn stat_formatting() {
        assert_eq!(stat(None), "—");
        assert_eq!(stat(Some(42.0)), "42");
        assert_eq!(stat(Some(12.5)), "12.50");
        assert_eq!(stat(Some(1.0 / 3.0)), "0.33");
    }

    fn sample_report() -> FightReport {
        let mut report = FightReport {
            duration_sec: 10.0,
            damage_bonus: 11,
            damage_bonus_total: 22,
            calculated_to_hit: 511,
            offense_skill: 252,
            offense_rating: 372,
            offense_rating_from_str: 120,
            displayed_attack: 1186,
            crit_hits: 1,
            crit_damage_gain: 25,
            total_damage: 55,
            ..Default::default()
        };
        report.weapon1.record_round(1);
        report.weapon1.record_round(2);
        report.weapon1.rounds = 2;
        report.weapon1.record_hit(20);
        report.weapon1.record_hit(35);
        report.weapon1.record_miss();
        report.finalize();
        report
    }

    #[test]
    fn melee_report_text() {
        let text = format_report(&sample_report(), Some("Sword"), None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--- Combat Report ---");
        assert_eq!(lines[1], "Duration: 10 seconds");
        assert!(text.contains("Damage from bonus: 22"));
        assert!(text.contains("Net DPS from criticals (vs normal): 2.50"));
        assert!(text.contains("\n\nSword\n  Combat rounds: 2\n"));
        assert!(text.contains("  Single / Double / Triple (% of rounds): 50.0% / 50.0% / 0.0%"));
        assert!(text.contains("  Overall accuracy: 66.7%"));
        assert!(text.contains("  Median hit: 27.50"));
        assert!(text.contains("  Mode hit: 20"));
        assert!(!text.contains("Weapon 2"));
        assert!(!text.contains("Elemental damage"));
        assert!(text.ends_with("\n\nTotal damage: 55\nDPS: 5.50"));
    }

    #[test]
    fn backstab_section() {
        let mut report = sample_report();
        report.special = Some(SpecialReport {
            name: "Backstab".into(),
            attempts: 4,
            hits: 3,
            total_damage: 400,
            max_damage: 180,
            backstab: Some(BackstabReport {
                double_backstabs: 1,
                skill: 225,
                mod_percent: 10,
            }),
            ..Default::default()
        });
        let text = format_report(&report, None, None);
        assert!(text.contains("\n\nBackstab\n  Count: 3\n  Attempts: 4\n  Accuracy: 75.0%\n"));
        assert!(text.contains("  DPS: 40.00"));
        assert!(text.contains("  Double backstabs: 1"));
        assert!(text.contains("  Effective backstab skill: 247 (skill + 10% mod, cap 255)"));
    }

    #[test]
    fn ranged_report_text() {
        let mut report = RangedFightReport {
            duration_sec: 60.0,
            total_damage: 0,
            wall_penalty_damage_lost: Some(0),
            ..Default::default()
        };
        report.ranged.record_miss();
        report.finalize();
        let text = format_ranged_report(&report);
        assert!(text.starts_with("--- Ranged Combat Report ---\nDuration: 60 seconds"));
        assert!(text.contains("  Shots: 1\n  Hits: 0\n  Accuracy: 0.0%"));
        assert!(text.contains("  Min hit: —"));
        assert!(text.contains("Damage lost to wall penalty: 0\nTotal damage: 0\nDPS: 0.00"));
    }

    #[test]
    fn ranged_error_text() {
        let result = Err(SimError::RangedDamageTooLow);
        assert_eq!(
            format_ranged_result(&result),
            "Ranged weapon + arrow damage must be at least 1"
        );
    }
}

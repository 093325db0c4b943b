use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use paper_core::model::{Bank, Points, Question};

/// Automatic selection by target points.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub topics: Vec<String>,
    pub target_points: Points,
    pub exclude_unrelated: bool,
    /// Fixes the random source so the same request replays the same paper.
    pub seed: Option<u64>,
}

/// Questions picked for a paper, in paper order.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'b> {
    pub questions: Vec<&'b Question>,
    pub total_points: Points,
    /// Number of round-robin passes over the topics.
    pub rounds: usize,
}

/// Request-scoped random source: seeded when a seed is given, otherwise
/// drawn from OS entropy.
#[must_use]
pub fn request_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Groups still available for one topic; each group keeps bank order.
type TopicPool<'b> = Vec<Vec<&'b Question>>;

/// One pool per requested topic present in the bank, in request order.
///
/// Unknown and repeated topic names are skipped. With `exclude_unrelated`,
/// unrelated questions are filtered out and groups left empty are dropped.
fn build_pools<'b>(bank: &'b Bank, topics: &[String], exclude_unrelated: bool) -> Vec<TopicPool<'b>> {
    let mut seen = HashSet::new();
    topics
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter_map(|name| bank.topic(name))
        .map(|topic| {
            topic
                .groups()
                .iter()
                .map(|group| {
                    group
                        .questions
                        .iter()
                        .filter(|q| !(exclude_unrelated && q.is_unrelated()))
                        .collect::<Vec<_>>()
                })
                .filter(|questions| !(exclude_unrelated && questions.is_empty()))
                .collect()
        })
        .collect()
}

/// Length and points of the longest leading run of `group` within `remaining`.
pub fn max_fitting_prefix(group: &[&Question], remaining: Points) -> (usize, Points) {
    let mut taken = 0;
    let mut total = Points::ZERO;
    for question in group {
        let points = question.points();
        if total + points > remaining {
            break;
        }
        total += points;
        taken += 1;
    }
    (taken, total)
}

/// Pick questions approaching `target_points` without exceeding it.
///
/// Groups are shuffled within each topic and topics are visited round-robin
/// from a random offset that moves by one each round. A group that fits is
/// taken whole; otherwise its longest fitting prefix is taken, and a group
/// whose first question already overshoots is discarded. Selection stops at
/// the target, when every pool is empty, or after a round that added nothing.
pub fn select_questions<'b, R>(bank: &'b Bank, request: &SelectionRequest, rng: &mut R) -> Selection<'b>
where
    R: Rng + ?Sized,
{
    let target = request.target_points;
    let mut pools = build_pools(bank, &request.topics, request.exclude_unrelated);
    for pool in &mut pools {
        pool.shuffle(rng);
    }

    let mut order: Vec<usize> = (0..pools.len()).collect();
    order.shuffle(rng);
    let mut start = if order.is_empty() {
        0
    } else {
        rng.random_range(0..order.len())
    };

    let mut questions = Vec::new();
    let mut total = Points::ZERO;
    let mut rounds = 0;

    while total < target && pools.iter().any(|pool| !pool.is_empty()) {
        rounds += 1;
        let mut progressed = false;

        for step in 0..order.len() {
            if total >= target {
                break;
            }
            let pool = &mut pools[order[(start + step) % order.len()]];
            let Some(group) = pool.pop() else {
                continue;
            };

            let remaining = target - total;
            let group_total: Points = group.iter().map(|q| q.points()).sum();
            if group_total <= remaining {
                questions.extend_from_slice(&group);
                total += group_total;
                progressed = true;
            } else {
                let (taken, prefix_total) = max_fitting_prefix(&group, remaining);
                if taken > 0 {
                    questions.extend_from_slice(&group[..taken]);
                    total += prefix_total;
                    progressed = true;
                }
            }
        }

        start = (start + 1) % order.len();
        if !progressed {
            break;
        }
    }

    tracing::debug!(
        selected = questions.len(),
        total = %total,
        target = %target,
        rounds,
        "selected questions by points"
    );

    Selection {
        questions,
        total_points: total,
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use paper_core::model::{QuestionGroup, QuestionId, Topic};

    fn q(id: &str, points: f64) -> Question {
        Question {
            question_id: Some(QuestionId::new(id)),
            points: Some(Points::new(points).unwrap()),
            ..Question::default()
        }
    }

    fn tagged(id: &str, points: f64, tag: &str) -> Question {
        Question {
            tags: vec![tag.to_string()],
            ..q(id, points)
        }
    }

    fn group(questions: Vec<Question>) -> QuestionGroup {
        QuestionGroup {
            questions,
            ..QuestionGroup::default()
        }
    }

    fn request(topics: &[&str], target: f64, seed: u64) -> SelectionRequest {
        SelectionRequest {
            topics: topics.iter().map(|t| (*t).to_string()).collect(),
            target_points: Points::new(target).unwrap(),
            exclude_unrelated: false,
            seed: Some(seed),
        }
    }

    fn run<'b>(bank: &'b Bank, request: &SelectionRequest) -> Selection<'b> {
        let mut rng = request_rng(request.seed);
        select_questions(bank, request, &mut rng)
    }

    fn ids(selection: &Selection<'_>) -> Vec<String> {
        selection
            .questions
            .iter()
            .map(|q| q.id_str().to_string())
            .collect()
    }

    /// Three topics with uneven multi-part groups.
    fn mixed_bank() -> Bank {
        let topics = ["Recursion", "Networks", "Databases"]
            .iter()
            .enumerate()
            .map(|(t, name)| {
                let groups = (0..5)
                    .map(|g| {
                        let parts = (0..=(g + t) % 4)
                            .map(|p| {
                                let points = f64::from(u32::try_from((g * 3 + p * 2 + t) % 7 + 1).unwrap());
                                q(&format!("{name}-{g}-{p}"), points)
                            })
                            .collect();
                        group(parts)
                    })
                    .collect();
                Topic::new(*name, groups)
            })
            .collect();
        Bank::new(topics).unwrap()
    }

    #[test]
    fn scenario_whole_group_undershoots_target() {
        let bank = Bank::new(vec![Topic::new("T", vec![group(vec![q("a", 2.0), q("b", 3.0)])])]).unwrap();
        let selection = run(&bank, &request(&["T"], 10.0, 1));
        assert_eq!(ids(&selection), vec!["a", "b"]);
        assert_eq!(selection.total_points, Points::from(5));
    }

    #[test]
    fn scenario_prefix_of_overshooting_group() {
        let bank = Bank::new(vec![Topic::new(
            "T",
            vec![group(vec![q("q1", 4.0), q("q2", 4.0), q("q3", 4.0)])],
        )])
        .unwrap();
        let selection = run(&bank, &request(&["T"], 5.0, 7));
        assert_eq!(ids(&selection), vec!["q1"]);
        assert_eq!(selection.total_points, Points::from(4));
    }

    #[test]
    fn scenario_unrelated_only_group_is_dropped() {
        let bank = Bank::new(vec![Topic::new(
            "T",
            vec![
                group(vec![tagged("off", 3.0, "Unrelated")]),
                group(vec![q("on", 2.0)]),
            ],
        )])
        .unwrap();

        let pools = build_pools(&bank, &["T".to_string()], true);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].len(), 1);

        let mut req = request(&["T"], 10.0, 3);
        req.exclude_unrelated = true;
        assert_eq!(ids(&run(&bank, &req)), vec!["on"]);
    }

    #[test]
    fn unrelated_parts_are_filtered_inside_groups() {
        let bank = Bank::new(vec![Topic::new(
            "T",
            vec![group(vec![q("a", 1.0), tagged("b", 1.0, "unrelated"), q("c", 1.0)])],
        )])
        .unwrap();
        let mut req = request(&["T"], 10.0, 0);
        req.exclude_unrelated = true;
        assert_eq!(ids(&run(&bank, &req)), vec!["a", "c"]);

        req.exclude_unrelated = false;
        assert_eq!(ids(&run(&bank, &req)), vec!["a", "b", "c"]);
    }

    #[test]
    fn scenario_zero_target_selects_nothing() {
        let bank = mixed_bank();
        for target in [0.0, -5.0] {
            let selection = run(&bank, &request(&["Recursion", "Networks"], target, 11));
            assert!(selection.questions.is_empty());
            assert_eq!(selection.total_points, Points::ZERO);
            assert_eq!(selection.rounds, 0);
        }
    }

    #[test]
    fn scenario_zero_point_groups_never_overshoot() {
        let bank = Bank::new(vec![
            Topic::new("A", vec![group(vec![q("a0", 0.0)]), group(vec![q("a5", 5.0)])]),
            Topic::new("B", vec![group(vec![q("b0", 0.0)]), group(vec![q("b5", 5.0)])]),
        ])
        .unwrap();

        for seed in 0..50 {
            let selection = run(&bank, &request(&["A", "B"], 5.0, seed));
            let selected = ids(&selection);
            let fives = selected.iter().filter(|id| id.ends_with('5')).count();
            assert_eq!(fives, 1, "seed {seed}: {selected:?}");
            assert_eq!(selection.total_points, Points::from(5));
        }
    }

    #[test]
    fn unknown_and_repeated_topics_are_ignored() {
        let bank = Bank::new(vec![Topic::new("T", vec![group(vec![q("x", 1.0)])])]).unwrap();
        let selection = run(&bank, &request(&["Nope", "T", "T"], 10.0, 5));
        assert_eq!(ids(&selection), vec!["x"]);

        let selection = run(&bank, &request(&["Nope"], 10.0, 5));
        assert!(selection.questions.is_empty());
    }

    #[test]
    fn first_part_overshoot_discards_whole_group() {
        let bank = Bank::new(vec![Topic::new(
            "T",
            vec![group(vec![q("big", 9.0), q("tail", 1.0)]), group(vec![q("small", 2.0)])],
        )])
        .unwrap();
        for seed in 0..20 {
            let selected = ids(&run(&bank, &request(&["T"], 3.0, seed)));
            // A lone topic whose head group overshoots ends the selection.
            assert!(
                selected.is_empty() || selected == vec!["small"],
                "seed {seed}: {selected:?}"
            );
        }
    }

    #[test]
    fn overshooting_topic_does_not_block_others() {
        let bank = Bank::new(vec![
            Topic::new("Big", vec![group(vec![q("big", 9.0), q("tail", 1.0)])]),
            Topic::new("Small", vec![group(vec![q("small", 2.0)])]),
        ])
        .unwrap();
        for seed in 0..20 {
            let selected = ids(&run(&bank, &request(&["Big", "Small"], 3.0, seed)));
            assert_eq!(selected, vec!["small"], "seed {seed}");
        }
    }

    #[test]
    fn prefix_is_maximal() {
        let a = q("a", 2.0);
        let b = q("b", 3.0);
        let c = q("c", 1.0);
        let group = [&a, &b, &c];

        assert_eq!(max_fitting_prefix(&group, Points::from(1)), (0, Points::ZERO));
        assert_eq!(max_fitting_prefix(&group, Points::from(4)), (1, Points::from(2)));
        assert_eq!(max_fitting_prefix(&group, Points::from(5)), (2, Points::from(5)));
        assert_eq!(max_fitting_prefix(&group, Points::from(6)), (3, Points::from(6)));

        for budget in 0..8 {
            let budget = Points::from(budget);
            let (taken, _) = max_fitting_prefix(&group, budget);
            if taken < group.len() {
                let longer: Points = group[..=taken].iter().map(|q| q.points()).sum();
                assert!(longer > budget);
            }
        }
    }

    #[test]
    fn same_seed_replays_same_paper() {
        let bank = mixed_bank();
        let req = request(&["Recursion", "Networks", "Databases"], 23.0, 42);
        let first = ids(&run(&bank, &req));
        let second = ids(&run(&bank, &req));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn selections_preserve_group_order_and_budget() {
        let bank = mixed_bank();
        let mut position: HashMap<*const Question, (usize, usize)> = HashMap::new();
        let mut group_no = 0;
        for topic in bank.topics() {
            for group in topic.groups() {
                for (index, question) in group.questions.iter().enumerate() {
                    position.insert(std::ptr::from_ref(question), (group_no, index));
                }
                group_no += 1;
            }
        }

        for seed in 0..200 {
            for target in [1.0, 7.0, 18.0, 40.0, 500.0] {
                let req = request(&["Databases", "Recursion", "Networks"], target, seed);
                let selection = run(&bank, &req);

                assert!(selection.total_points <= req.target_points);
                assert!(selection.rounds <= bank.group_count());
                let summed: Points = selection.questions.iter().map(|q| q.points()).sum();
                assert_eq!(summed, selection.total_points);

                let mut seen_groups = HashSet::new();
                let mut previous: Option<(usize, usize)> = None;
                for question in &selection.questions {
                    let (g, index) = position[&std::ptr::from_ref(*question)];
                    if index == 0 {
                        assert!(seen_groups.insert(g), "group {g} resumed (seed {seed})");
                    } else {
                        assert_eq!(previous, Some((g, index - 1)), "part out of order (seed {seed})");
                    }
                    previous = Some((g, index));
                }
            }
        }
    }

    #[test]
    fn large_target_takes_everything() {
        let bank = mixed_bank();
        let all: usize = bank
            .topics()
            .iter()
            .flat_map(|t| t.groups())
            .map(|g| g.questions.len())
            .sum();
        let selection = run(&bank, &request(&["Recursion", "Networks", "Databases"], 10_000.0, 9));
        assert_eq!(selection.questions.len(), all);
    }
}

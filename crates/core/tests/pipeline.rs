use rand::rngs::StdRng;
use rand::SeedableRng;
use smartexam_core::export::export_text;
use smartexam_core::grade::{derive_retest_set, grade, RetestFilter, ScoringConfig, Submission};
use smartexam_core::model::{Label, LabelSet};
use smartexam_core::parse::parse;
use smartexam_core::shuffle::{shuffle, ShuffleOptions};

const SCENARIO: &str = "\
Q1: 2+2=?
A) 3
B) 4
Answer: B
Explanation: Basic arithmetic.

Q2: Capital of France?
A) Paris
B) Lyon
Answer: A
";

fn labels(chars: &[char]) -> LabelSet {
    chars.iter().map(|c| Label::try_from(*c).unwrap()).collect()
}

#[test]
fn test_concrete_scenario() {
    let questions = parse(SCENARIO);
    assert_eq!(questions.len(), 2);

    let mut submission = Submission::new();
    submission.select(0, labels(&['B']));
    submission.select(1, labels(&['B']));

    let report = grade(&questions, &submission, &ScoringConfig::default());
    assert_eq!(report.summary.correct, 1);
    assert_eq!(report.summary.percent, 50);

    let retest = derive_retest_set(&report.results, RetestFilter::Wrong);
    assert_eq!(retest.len(), 1);
    assert_eq!(retest[0].stem, "Capital of France?");
    assert_eq!(retest[0].options.len(), 2);
    assert_eq!(retest[0].correct, labels(&['A']));
    assert_eq!(retest[0].correct_texts(), vec!["Paris"]);
}

#[test]
fn test_dropped_block_count() {
    let text = "\
Q1: one
A) a
B) b
Answer: A

Q2: two
A) a
B) b
Answer: B

Q3: only one option
A) lonely
Answer: A

Q4: four
A) a
B) b
C) c
Answer: C

Q5: five
A) a
B) b
Answer: A & B
";
    let questions = parse(text);
    assert_eq!(questions.len(), 4);
    let stems: Vec<&str> = questions.iter().map(|q| q.stem.as_str()).collect();
    assert_eq!(stems, vec!["one", "two", "four", "five"]);
}

#[test]
fn test_round_trip_through_grading() {
    let text = "\
Preamble that is not a question.
Q1: Which are primes?
A) 2
B) 4
C) 5
D) 6
Answer: A, C
Explanation: 2 and 5 have no divisors
other than 1 and themselves.

Q2: Wrapped
stem text
A) first option
continues here
B) second
Answer: b)
";
    let original = parse(text);
    assert_eq!(original.len(), 2);

    let report = grade(&original, &Submission::new(), &ScoringConfig::default());
    let exported = smartexam_core::export::export_results_text(&report.results);
    let reparsed = parse(&exported);

    assert_eq!(reparsed.len(), original.len());
    for (a, b) in original.iter().zip(&reparsed) {
        assert_eq!(a.stem, b.stem);
        assert_eq!(a.options, b.options);
        assert_eq!(a.correct, b.correct);
        assert_eq!(a.explanation, b.explanation);
    }
}

#[test]
fn test_multi_answer_parsing() {
    let questions = parse("Q1: pick\nA) a\nB) b\nC) c\nD) d\nAnswer: B & D\n");
    assert_eq!(questions[0].correct, labels(&['B', 'D']));
}

#[test]
fn test_option_q_is_not_a_question_header() {
    let mut text = String::from("Q1: many options\n");
    for i in 0..16u8 {
        text.push_str(&format!("{}) opt{}\n", (b'A' + i) as char, i + 1));
    }
    text.push_str("Q: opt17\nAnswer: Q\nExplanation: the last one\nq: a note\n");

    let questions = parse(&text);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].options.len(), 17);
    assert_eq!(questions[0].correct, labels(&['Q']));
    assert_eq!(questions[0].correct_texts(), vec!["opt17"]);
    assert_eq!(questions[0].explanation, "the last one\nq: a note");
}

#[test]
fn test_malformed_answer_tolerance() {
    let questions = parse("Q1: pick\nA) a\nB) b\nAnswer: b)\n");
    assert_eq!(questions[0].correct, labels(&['B']));
}

#[test]
fn test_grading_after_shuffle_matches_by_text() {
    let questions = parse(SCENARIO);
    let options = ShuffleOptions {
        questions: true,
        options: true,
    };

    for seed in 0..32 {
        let shuffled = shuffle(&questions, &options, &mut StdRng::seed_from_u64(seed));

        // Select the option whose text was correct before shuffling.
        let mut submission = Submission::new();
        for (index, question) in shuffled.iter().enumerate() {
            let original = questions
                .iter()
                .find(|q| q.stem == question.stem)
                .unwrap();
            let wanted = original.correct_texts();
            let picked: LabelSet = question
                .options
                .iter()
                .filter(|o| wanted.contains(&o.text.as_str()))
                .map(|o| o.label)
                .collect();
            submission.select(index, picked);
        }

        let report = grade(&shuffled, &submission, &ScoringConfig::default());
        assert_eq!(report.summary.percent, 100, "seed {seed}");
    }
}

#[test]
fn test_retest_can_be_retested() {
    let questions = parse(SCENARIO);
    let first = grade(&questions, &Submission::new(), &ScoringConfig::default());
    let retest = derive_retest_set(&first.results, RetestFilter::Wrong);
    assert_eq!(retest.len(), 2);

    let mut submission = Submission::new();
    submission.select(0, retest[0].correct.clone());
    let second = grade(&retest, &submission, &ScoringConfig::default());
    let again = derive_retest_set(&second.results, RetestFilter::Wrong);
    assert_eq!(again.len(), 1);
    assert_eq!(export_text(&again), export_text(&retest[1..]));
}

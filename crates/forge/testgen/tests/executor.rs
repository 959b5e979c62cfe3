//! Generator execution and cross-validation against the embedded interpreter

use forge_judge::JudgeEngine;
use forge_sandbox::{BoaSandbox, SandboxConfig, ScriptSandbox};
use forge_testgen::*;
use forge_types::{Difficulty, JudgeConfig, Parameter, ProblemSpec, TestCase, ValueType};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TWO_SUM_HASHMAP: &str = r#"
function twoSum(nums, target) {
    var seen = {};
    for (var i = 0; i < nums.length; i++) {
        var need = target - nums[i];
        if (seen[need] !== undefined) return [seen[need], i];
        seen[nums[i]] = i;
    }
    return [];
}
"#;

const TWO_SUM_NESTED: &str = r#"
function twoSum(nums, target) {
    for (var i = 0; i < nums.length; i++) {
        for (var j = i + 1; j < nums.length; j++) {
            if (nums[i] + nums[j] === target) return [i, j];
        }
    }
    return [];
}
"#;

/// Distinct shifted powers of two: every pair sum is unique, so both
/// solutions agree on every case.
const TWO_SUM_GENERATOR: &str = r#"
var seed = 7;
function rand(n) { seed = (seed * 16807) % 2147483647; return seed % n; }
var cases = [];
for (var t = 0; t < 12; t++) {
    var len = 10 - (t % 9);
    var nums = [];
    for (var i = 0; i < len; i++) nums.push(Math.pow(2, i) - 100);
    for (var k = len - 1; k > 0; k--) {
        var r = rand(k + 1), tmp = nums[k];
        nums[k] = nums[r];
        nums[r] = tmp;
    }
    var a = rand(len);
    var b = (a + 1 + rand(len - 1)) % len;
    var target = nums[a] + nums[b];
    cases.push({ input: [nums, target], output: context.solution(nums.slice(), target) });
}
return cases;
"#;

fn two_sum() -> ProblemSpec {
    ProblemSpec {
        slug: "two-sum".into(),
        title: "Two Sum".into(),
        statement: "Return the indices of the two numbers that add up to target.".into(),
        constraints: "2 ≤ nums.length ≤ 10\n-10⁹ ≤ nums[i] ≤ 10⁹\nExactly one valid answer exists.".into(),
        topics: vec!["array".into(), "hash-table".into()],
        difficulty: Difficulty::Easy,
        parameters: vec![
            Parameter::new("nums", ValueType::NumberArray),
            Parameter::new("target", ValueType::Number),
        ],
        return_type: ValueType::NumberArray,
        function_name: "twoSum".into(),
        judge_config: None,
        starting_code: "function twoSum(nums, target) {\n}".into(),
        solution: TWO_SUM_HASHMAP.into(),
        secondary_solution: TWO_SUM_NESTED.into(),
        output_order_matters: false,
    }
}

fn sandbox() -> Arc<dyn ScriptSandbox> {
    Arc::new(BoaSandbox::default())
}

fn executor() -> TestCaseExecutor {
    TestCaseExecutor::new(sandbox(), ExecutorConfig::default().with_timeout(10))
}

fn cross_validator() -> CrossValidator {
    let sandbox = sandbox();
    CrossValidator::new(
        SolutionRunner::new(sandbox.clone(), Duration::from_secs(5)),
        JudgeEngine::new(sandbox, Duration::from_secs(5)),
    )
}

#[tokio::test]
async fn test_two_sum_generation_and_agreement() {
    let problem = two_sum();
    let outcome = executor()
        .execute(TWO_SUM_GENERATOR, &problem, &[])
        .await
        .unwrap();
    assert_eq!(outcome.cases.len(), 12);
    assert_eq!(outcome.rejected_by_constraints, 0);

    let validation = cross_validator().validate_all(&problem, &outcome.cases).await;
    assert_eq!(validation.kept.len(), 12);
    assert!(validation.discarded.is_empty());
}

#[tokio::test]
async fn test_length_eleven_case_is_rejected() {
    let generator = r#"
        var ok = [3, 2, 4];
        var tooLong = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        return [
            { input: [ok, 6], output: context.solution(ok, 6) },
            { input: [tooLong, 21], output: context.solution(tooLong, 21) }
        ];
    "#;
    let outcome = executor().execute(generator, &two_sum(), &[]).await.unwrap();
    assert_eq!(outcome.rejected_by_constraints, 1);
    assert_eq!(outcome.cases, vec![TestCase::new(vec![json!([3, 2, 4]), json!(6)], json!([1, 2]))]);
}

#[tokio::test]
async fn test_all_cases_out_of_bounds_is_a_validation_error() {
    let generator = "function (context) { return [{ input: [[1], 1], output: [] }]; }";
    let err = executor().execute(generator, &two_sum(), &[]).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Validation(ref msg) if msg.contains("constraints")));
    assert_eq!(err.retry_action(), RetryAction::Regenerate);
}

#[tokio::test]
async fn test_duplicates_of_existing_cases_are_dropped() {
    let existing = vec![TestCase::new(vec![json!([3, 3]), json!(6)], json!([0, 1]))];
    let generator = r#"
        return [
            { input: [[3, 3], 6], output: [0, 1] },
            { input: [[1, 5], 6], output: [0, 1] },
            { input: [[1, 5], 6], output: [0, 1] }
        ];
    "#;
    let outcome = executor().execute(generator, &two_sum(), &existing).await.unwrap();
    assert_eq!(outcome.duplicates, 2);
    assert_eq!(outcome.cases.len(), 1);
}

#[tokio::test]
async fn test_generator_sees_context() {
    let generator = r#"
        if (context.functionName !== "twoSum") throw new Error("no function name");
        if (context.existingTests.length !== 1) throw new Error("no existing tests");
        if (context.parameters[0].type !== "number[]") throw new Error("no parameter types");
        return [{ input: [[2, 7], 9], output: context.solution([2, 7], 9) }];
    "#;
    let existing = vec![TestCase::new(vec![json!([3, 3]), json!(6)], json!([0, 1]))];
    let outcome = executor().execute(generator, &two_sum(), &existing).await.unwrap();
    assert_eq!(outcome.cases[0].output, json!([0, 1]));
}

#[tokio::test]
async fn test_every_generator_form_is_invoked() {
    let executor = executor();
    let problem = two_sum();
    let expected = vec![TestCase::new(vec![json!([1, 2]), json!(3)], json!([0, 1]))];

    for generator in [
        "(context) => [{ input: [[1, 2], 3], output: context.solution([1, 2], 3) }]",
        "context => { return [{ input: [[1, 2], 3], output: context.solution([1, 2], 3) }]; }",
        "function (context) { return [{ input: [[1, 2], 3], output: context.solution([1, 2], 3) }]; }",
        r#"function generateTests(context) {
            return [{ input: [[1, 2], 3], output: context.solution([1, 2], 3) }];
        }"#,
        r#"var nums = [1, 2];
        function generateTests(context) {
            return [{ input: [nums, 3], output: context.solution(nums.slice(), 3) }];
        }"#,
        "return [{ input: [[1, 2], 3], output: context.solution([1, 2], 3) }];",
    ] {
        let outcome = executor
            .execute(generator, &problem, &[])
            .await
            .unwrap_or_else(|e| panic!("{generator:?} gave {e:?}"));
        assert_eq!(outcome.cases, expected, "{generator:?}");
    }
}

#[tokio::test]
async fn test_malformed_results() {
    let executor = executor();
    let problem = two_sum();
    for generator in [
        "return 42;",
        "return [];",
        "return [{ output: [0, 1] }];",
        "return [{ input: [[1, 2]], output: [0, 1] }];",
    ] {
        let err = executor.execute(generator, &problem, &[]).await.unwrap_err();
        assert!(
            matches!(err, ExecutorError::Validation(_)),
            "{generator:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_syntax_and_runtime_errors() {
    let executor = executor();
    let problem = two_sum();

    let err = executor.execute("return [{ input: ", &problem, &[]).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Syntax(_)), "{err:?}");
    assert_eq!(err.retry_action(), RetryAction::Regenerate);

    let err = executor
        .execute("throw new Error('factory broke');", &problem, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Runtime(ref msg) if msg.contains("factory broke")));
}

#[tokio::test]
async fn test_runaway_generator_times_out() {
    let sandbox = Arc::new(BoaSandbox::new(
        SandboxConfig::default().with_loop_iteration_limit(1_000),
    ));
    let executor = TestCaseExecutor::new(sandbox, ExecutorConfig::default().with_timeout(5));
    let err = executor
        .execute("while (true) {}", &two_sum(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Timeout { .. }), "{err:?}");
    assert_eq!(err.retry_action(), RetryAction::RerunSameCode);
    assert!(err.to_string().contains("constraints"));
}

#[tokio::test]
async fn test_structural_cases_are_serialized() {
    let mut problem = two_sum();
    problem.slug = "reverse-linked-list".into();
    problem.constraints = String::new();
    problem.parameters = vec![Parameter::new("head", ValueType::ListNode)];
    problem.return_type = ValueType::ListNode;
    problem.function_name = "reverseList".into();
    problem.output_order_matters = true;
    problem.solution = r#"
        function reverseList(head) {
            var prev = null;
            while (head) { var next = head.next; head.next = prev; prev = head; head = next; }
            return prev;
        }
    "#
    .into();

    let generator = r#"
        return [[1, 2, 3], []].map(function (xs) {
            return { input: [arrayToList(xs)], output: context.solution(arrayToList(xs)) };
        });
    "#;
    let outcome = executor().execute(generator, &problem, &[]).await.unwrap();
    assert_eq!(
        outcome.cases,
        vec![
            TestCase::new(vec![json!([1, 2, 3])], json!([3, 2, 1])),
            TestCase::new(vec![json!([])], json!([])),
        ]
    );
}

#[tokio::test]
async fn test_wrong_secondary_solution_discards() {
    let mut problem = two_sum();
    problem.secondary_solution = "function twoSum(nums, target) { return [0, 1]; }".into();
    let cases = vec![
        TestCase::new(vec![json!([2, 7, 11]), json!(9)], json!([0, 1])),
        TestCase::new(vec![json!([3, 2, 4]), json!(6)], json!([1, 2])),
    ];
    let validator = cross_validator();

    let outcome = validator.validate_case(&problem, &cases[1]).await;
    assert!(!outcome.passed);
    assert!(outcome.primary.pass);
    assert!(!outcome.secondary.unwrap().pass);

    let validation = validator.validate_all(&problem, &cases).await;
    assert_eq!(validation.kept, vec![cases[0].clone()]);
    assert_eq!(validation.discarded, vec![cases[1].clone()]);
}

#[tokio::test]
async fn test_mutating_judge_sees_mutated_arguments() {
    let problem = ProblemSpec {
        slug: "remove-duplicates".into(),
        title: "Remove Duplicates from Sorted Array".into(),
        statement: "Remove duplicates in place and return the new length.".into(),
        constraints: "1 <= nums.length <= 100".into(),
        topics: vec!["array".into()],
        difficulty: Difficulty::Easy,
        parameters: vec![Parameter::new("nums", ValueType::NumberArray)],
        return_type: ValueType::Number,
        function_name: "removeDuplicates".into(),
        judge_config: Some(JudgeConfig::MutatingArrayWithK {
            array_param_index: 0,
            k_is_return_value: true,
            ignore_order: false,
        }),
        starting_code: "function removeDuplicates(nums) {\n}".into(),
        solution: r#"
            function removeDuplicates(nums) {
                var k = 0;
                for (var i = 0; i < nums.length; i++) {
                    if (i === 0 || nums[i] !== nums[k - 1]) nums[k++] = nums[i];
                }
                return k;
            }
        "#
        .into(),
        secondary_solution: r#"
            function removeDuplicates(nums) {
                var unique = nums.filter(function (x, i) { return i === 0 || x !== nums[i - 1]; });
                unique.forEach(function (x, i) { nums[i] = x; });
                return unique.length;
            }
        "#
        .into(),
        output_order_matters: true,
    };
    let case = TestCase::new(vec![json!([0, 0, 1, 1, 1, 2, 2, 3, 3, 4])], json!([0, 1, 2, 3, 4]));
    let outcome = cross_validator().validate_case(&problem, &case).await;
    assert!(outcome.passed, "{outcome:?}");

    let broken = "function removeDuplicates(nums) { return 5; }";
    let verdict = cross_validator().grade(&problem, broken, &case).await;
    assert!(!verdict.pass);
}

#[tokio::test]
async fn test_runner_reports_failures() {
    let runner = SolutionRunner::new(sandbox(), Duration::from_secs(5));
    let case = TestCase::new(vec![json!([1, 2]), json!(3)], json!([0, 1]));
    let err = runner
        .run_case(&two_sum(), "function twoSum() { throw new Error('nope'); }", &case)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nope"));

    let run = runner.run_case(&two_sum(), TWO_SUM_NESTED, &case).await.unwrap();
    assert_eq!(run.return_value, json!([0, 1]));
    assert_eq!(run.args, case.input);
}

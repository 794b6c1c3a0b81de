mod common;

use common::{empty_reply, png, table, ScriptedModel};
use pretty_assertions::assert_eq;
use similar_question_gpt::error::PipelineError;
use similar_question_gpt::services::prompts;
use similar_question_gpt::services::{RetrievalPolicy, TranscriptionVariant, UserContent};
use similar_question_gpt::workflow::{
    ExamPipeline, InteractionCtx, NoopObserver, PipelineStage, StageObserver, Step,
};

/// 记录观察到的事件顺序
#[derive(Default)]
struct RecordingObserver {
    stages: Vec<PipelineStage>,
    started: Vec<Step>,
    finished: Vec<(Step, String)>,
    failed: Vec<Step>,
}

impl StageObserver for RecordingObserver {
    fn on_stage(&mut self, stage: PipelineStage) {
        self.stages.push(stage);
    }

    fn on_step_started(&mut self, step: Step) {
        self.started.push(step);
    }

    fn on_step_finished(&mut self, step: Step, output: &str) {
        self.finished.push((step, output.to_string()));
    }

    fn on_failed(&mut self, error: &PipelineError) {
        self.failed.push(error.step());
    }
}

fn ctx() -> InteractionCtx {
    InteractionCtx::new("question.png")
}

#[tokio::test]
async fn test_stages_run_in_fixed_order() {
    let model = ScriptedModel::happy("解剖");
    let table = table(&["生理", "解剖", "理工"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::default());

    let mut observer = RecordingObserver::default();
    let report = pipeline.run(&png(), &ctx(), &mut observer).await.unwrap();

    assert_eq!(
        observer.stages,
        vec![
            PipelineStage::ImageReceived,
            PipelineStage::Transcribed,
            PipelineStage::DomainPredicted,
            PipelineStage::SimilarSelected,
            PipelineStage::Explained,
        ]
    );
    assert_eq!(observer.started, Step::ALL.to_vec());
    assert!(observer.failed.is_empty());

    let requests = model.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].system_prompt, prompts::transcribe_system(TranscriptionVariant::StemAndChoices));
    assert_eq!(requests[1].system_prompt, prompts::classify_system());
    assert!(requests[2].system_prompt.starts_with("以下の国家試験問題リストの中から"));
    assert_eq!(requests[3].system_prompt, prompts::explain_system());

    assert_eq!(report.image_name, "question.png");
    assert_eq!(report.domain, "解剖");
    assert_eq!(report.candidate_rows, vec![1]);
    assert_eq!(report.similar_questions, "1. 類似問題A\n2. 類似問題B");
    assert_eq!(report.explanation, "正解は c。\n【類題1】…");
}

#[tokio::test]
async fn test_each_stage_feeds_the_next() {
    let model = ScriptedModel::happy("解剖");
    let table = table(&["解剖"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::default());

    let report = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap();
    let requests = model.requests();

    // 1: 图片以 data URL 发送
    match &requests[0].user_content {
        UserContent::Image { data_url } => assert!(data_url.starts_with("data:image/png;base64,")),
        other => panic!("expected image content, got {other:?}"),
    }
    assert_eq!(requests[0].max_tokens, Some(1000));

    // 2: 识别结果作为用户消息
    assert_eq!(requests[1].user_content, UserContent::Text(report.transcription.clone()));
    assert_eq!(requests[1].max_tokens, None);

    // 3: 候选列表在系统提示词中，识别结果在用户消息中
    assert!(requests[2].system_prompt.ends_with("1. 設問1\na. 1\nb. 2\nc. 3\nd. 4\ne. 5"));
    assert_eq!(requests[2].user_content, UserContent::Text(report.transcription.clone()));
    assert_eq!(requests[2].max_tokens, Some(2000));

    // 4: 识别结果 + 相似题
    assert_eq!(
        requests[3].user_content,
        UserContent::Text(prompts::explain_user(&report.transcription, &report.similar_questions))
    );
    assert_eq!(requests[3].max_tokens, Some(2000));
}

#[tokio::test]
async fn test_failure_stops_later_stages() {
    let model = ScriptedModel::new(vec![Ok("問題文".to_string()), Err(empty_reply())]);
    let table = table(&["解剖"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::default());

    let mut observer = RecordingObserver::default();
    let err = pipeline.run(&png(), &ctx(), &mut observer).await.unwrap_err();

    assert_eq!(err.step(), Step::Classification);
    assert_eq!(model.call_count(), 2);
    assert_eq!(observer.failed, vec![Step::Classification]);
    assert_eq!(
        observer.finished,
        vec![(Step::Transcription, "問題文".to_string())]
    );
    assert_eq!(
        observer.stages,
        vec![PipelineStage::ImageReceived, PipelineStage::Transcribed]
    );
}

#[tokio::test]
async fn test_transcription_failure_makes_no_other_calls() {
    let model = ScriptedModel::new(vec![Err(empty_reply())]);
    let table = table(&["解剖"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::default());

    let err = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap_err();

    assert_eq!(err.step(), Step::Transcription);
    assert_eq!(model.call_count(), 1);
    assert!(err.to_string().starts_with("[問題文の読み取り]"));
}

#[tokio::test]
async fn test_filtered_candidates_are_matching_subset() {
    let model = ScriptedModel::happy("歯内");
    let domains = ["歯内療法", "解剖", "歯内療法", "理工", "歯内療法", "歯内療法"];
    let table = table(&domains);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::Filtered { limit: 3 });

    let report = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap();

    assert_eq!(report.candidate_rows, vec![0, 2, 4]);
    let prompt = &model.requests()[2].system_prompt;
    assert!(prompt.contains("1. 設問1"));
    assert!(prompt.contains("5. 設問5"));
    assert!(!prompt.contains("2. 設問2"));
    assert!(!prompt.contains("6. 設問6"));
}

#[tokio::test]
async fn test_no_matching_domain_still_asks_model() {
    let model = ScriptedModel::happy("補綴");
    let table = table(&["解剖", "理工"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::default());

    let report = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap();

    assert!(report.candidate_rows.is_empty());
    assert_eq!(model.call_count(), 4);
}

#[tokio::test]
async fn test_unfiltered_passes_whole_table_with_domain_hint() {
    let model = ScriptedModel::happy("解剖");
    let table = table(&["生理", "解剖", "理工"]);
    let pipeline = ExamPipeline::new(&model, &table, RetrievalPolicy::Unfiltered { limit: None })
        .with_transcription(TranscriptionVariant::WithAnswer);

    let report = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap();

    assert_eq!(report.candidate_rows, vec![0, 1, 2]);
    let requests = model.requests();
    assert_eq!(requests[0].system_prompt, prompts::transcribe_system(TranscriptionVariant::WithAnswer));
    assert!(requests[2].system_prompt.contains("出題領域「解剖」"));
    assert!(requests[2].system_prompt.contains("1. 【生理】設問1"));
    assert!(requests[2].system_prompt.contains("3. 【理工】設問3"));
}

#[tokio::test]
async fn test_unfiltered_prefix_is_independent_of_domain() {
    let table = table(&["生理", "解剖", "理工", "解剖"]);
    let policy = RetrievalPolicy::Unfiltered { limit: Some(2) };

    for domain in ["解剖", "理工", "存在しない"] {
        let model = ScriptedModel::happy(domain);
        let pipeline = ExamPipeline::new(&model, &table, policy);
        let report = pipeline.run(&png(), &ctx(), &mut NoopObserver).await.unwrap();
        assert_eq!(report.candidate_rows, vec![0, 1]);
    }
}

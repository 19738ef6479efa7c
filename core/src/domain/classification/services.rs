use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{error, info, warn};

use crate::domain::{
    classification::{
        entities::{ClassifyOutput, ModelInvocation, PromptSpec, ReasoningTrace},
        fallback::run_strategies,
        models::resolve_model,
        parser::parse_model_output,
        ports::{ChatTransport, ClassificationService, LocalClassifier},
        prompts::{build_classification_prompt, build_reasoning_prompt, build_selection_prompt},
        reasoning::{extract_candidates, selection_model},
        schema::get_food_result_schema,
        similarity::SimilarityScorer,
        value_objects::{ClassificationMode, ClassifyImageInput, OutputLanguage},
    },
    common::{entities::app_errors::CoreError, services::Service},
};

const KEY_PLACEHOLDERS: [&str; 2] = ["YOUR_KEY", "PASTE_API_KEY"];

/// Checks the API credential before any network call is made.
pub fn validate_api_key(api_key: Option<&str>) -> Result<&str, CoreError> {
    let key = api_key.map(str::trim).unwrap_or_default();

    if key.is_empty() {
        return Err(CoreError::Configuration(
            "OPENAI_API_KEY is not set".to_string(),
        ));
    }
    if KEY_PLACEHOLDERS.iter().any(|p| key.eq_ignore_ascii_case(p)) {
        return Err(CoreError::Configuration(
            "OPENAI_API_KEY still holds a placeholder value".to_string(),
        ));
    }
    if !key.is_ascii() {
        return Err(CoreError::Configuration(
            "OPENAI_API_KEY contains non-ASCII characters".to_string(),
        ));
    }
    if key.chars().any(|c| c.is_ascii_control()) {
        return Err(CoreError::Configuration(
            "OPENAI_API_KEY contains control characters".to_string(),
        ));
    }
    if !key.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("sk-")) {
        return Err(CoreError::Configuration(
            "OPENAI_API_KEY must start with 'sk-'".to_string(),
        ));
    }
    Ok(key)
}

struct ReasoningPass {
    model: String,
    raw: String,
    candidates: Vec<String>,
}

impl<T, L, S> Service<T, L, S>
where
    T: ChatTransport,
    L: LocalClassifier,
    S: SimilarityScorer,
{
    async fn classify_single(
        &self,
        model: &str,
        image_b64: &str,
        language: OutputLanguage,
    ) -> Result<ClassifyOutput, CoreError> {
        let resolved = resolve_model(model, self.settings.capabilities)?;
        let invocation = ModelInvocation {
            model: resolved.model,
            prompt: build_classification_prompt(&self.labels, language, None),
            image_b64: image_b64.to_string(),
        };

        let text = run_strategies(
            self.transport.as_ref(),
            resolved.style.strategies(),
            &invocation,
        )
        .await
        .inspect_err(|e| error!(model = %invocation.model, error = %e, "classification failed"))?;

        Ok(parse_model_output(&text, &self.labels, &self.matcher))
    }

    async fn reasoning_pass(&self, model: &str, image_b64: &str) -> Result<ReasoningPass, CoreError> {
        let resolved = resolve_model(model, self.settings.capabilities)?;
        let invocation = ModelInvocation {
            model: resolved.model,
            prompt: build_reasoning_prompt(&self.labels),
            image_b64: image_b64.to_string(),
        };

        let request = resolved.style.reasoning_strategy().request(&invocation);
        let raw = self.transport.send(request).await?;
        let candidates = extract_candidates(&raw, &self.labels);

        Ok(ReasoningPass {
            model: invocation.model,
            raw,
            candidates,
        })
    }

    async fn classify_reasoned(
        &self,
        image_b64: &str,
        language: OutputLanguage,
    ) -> Result<ClassifyOutput, CoreError> {
        let primary = self.settings.chat_model.as_str();

        // 1. Candidate pass on the primary model; any failure degrades to single pass
        let reasoning = match self.reasoning_pass(primary, image_b64).await {
            Ok(reasoning) => reasoning,
            Err(e) => {
                warn!(model = primary, error = %e, "reasoning pass failed, using single pass");
                return self.classify_single(primary, image_b64, language).await;
            }
        };
        info!(
            model = %reasoning.model,
            candidates = ?reasoning.candidates,
            "reasoning pass produced candidates"
        );

        // 2. Selection pass on the fallback model
        let chosen = selection_model(primary, self.settings.fallback_model.as_deref());
        let resolved = resolve_model(chosen, self.settings.capabilities)?;
        let invocation = ModelInvocation {
            model: resolved.model,
            prompt: PromptSpec {
                text: build_selection_prompt(&reasoning.candidates, language),
                schema: Some(get_food_result_schema(language)),
            },
            image_b64: image_b64.to_string(),
        };

        let text = run_strategies(
            self.transport.as_ref(),
            resolved.style.strategies(),
            &invocation,
        )
        .await
        .inspect_err(|e| error!(model = %invocation.model, error = %e, "selection pass failed"))?;

        // 3. Parse, correct and attach the trace
        let output = match parse_model_output(&text, &self.labels, &self.matcher) {
            ClassifyOutput::Structured(mut result) => {
                result.reasoning_trace = Some(ReasoningTrace {
                    primary_model: reasoning.model,
                    fallback_model: invocation.model,
                    raw_reasoning: reasoning.raw,
                    candidates: reasoning.candidates,
                });
                ClassifyOutput::Structured(result)
            }
            other => other,
        };
        Ok(output)
    }
}

impl<T, L, S> ClassificationService for Service<T, L, S>
where
    T: ChatTransport,
    L: LocalClassifier,
    S: SimilarityScorer,
{
    async fn classify_image(&self, input: ClassifyImageInput) -> Result<ClassifyOutput, CoreError> {
        if input.image_data.is_empty() {
            return Err(CoreError::Invalid("image is empty".to_string()));
        }

        let language = input
            .output_language
            .unwrap_or(self.settings.output_language);

        if input.mode == ClassificationMode::Local {
            let local = self
                .local_classifier
                .classify(input.image_data)
                .await
                .inspect_err(|e| error!(error = %e, "local classification failed"))?;
            return Ok(ClassifyOutput::Local(local));
        }

        validate_api_key(self.settings.api_key.as_deref())?;
        let image_b64 = STANDARD.encode(&input.image_data);

        match input.mode {
            ClassificationMode::ChatReasoned => self.classify_reasoned(&image_b64, language).await,
            _ => {
                self.classify_single(&self.settings.chat_model, &image_b64, language)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;
    use crate::domain::{
        classification::{
            entities::{LocalCandidate, LocalClassification},
            similarity::{LabelMatcher, SequenceRatio},
            testing::ScriptedTransport,
            value_objects::{AllowedLabels, ApiCapabilities, Endpoint, ResponseFormat},
        },
        common::services::ClassifierSettings,
    };

    struct StubLocal(Result<LocalClassification, CoreError>);

    impl LocalClassifier for StubLocal {
        fn classify(
            &self,
            _image_data: Vec<u8>,
        ) -> impl Future<Output = Result<LocalClassification, CoreError>> + Send {
            let outcome = self.0.clone();
            async move { outcome }
        }
    }

    const PIZZA_JSON: &str = r#"{"label": "pizza", "confidence": 0.9, "calories_kcal": 285, "serving": "1 slice", "notes": ""}"#;

    fn settings(api_key: &str) -> ClassifierSettings {
        ClassifierSettings {
            api_key: Some(api_key.to_string()),
            chat_model: "gpt-4o-mini".to_string(),
            fallback_model: Some("gpt-4.1-mini".to_string()),
            capabilities: ApiCapabilities::default(),
            output_language: OutputLanguage::En,
        }
    }

    fn service(
        script: Vec<Result<String, CoreError>>,
        local: Result<LocalClassification, CoreError>,
        api_key: &str,
    ) -> Service<ScriptedTransport, StubLocal, SequenceRatio> {
        Service::new(
            ScriptedTransport::new(script),
            StubLocal(local),
            LabelMatcher::new(SequenceRatio, 0.6),
            AllowedLabels::new(vec!["pizza".to_string(), "burger".to_string()]),
            settings(api_key),
        )
    }

    fn input(mode: ClassificationMode) -> ClassifyImageInput {
        ClassifyImageInput {
            image_data: vec![0xff, 0xd8, 0xff, 0xe0],
            mode,
            output_language: None,
        }
    }

    fn structured(output: ClassifyOutput) -> crate::domain::classification::entities::ClassificationResult {
        match output {
            ClassifyOutput::Structured(result) => result,
            other => panic!("expected structured output, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key(Some(" sk-test ")).unwrap(), "sk-test");
        assert!(validate_api_key(Some("SK-upper")).is_ok());
        assert!(validate_api_key(None).is_err());
        assert!(validate_api_key(Some("YOUR_KEY")).is_err());
        assert!(validate_api_key(Some("paste_api_key")).is_err());
        assert!(validate_api_key(Some("sk-키")).is_err());
        assert!(validate_api_key(Some("pk-123")).is_err());
        assert!(matches!(
            validate_api_key(Some("sk-a\nb")),
            Err(CoreError::Configuration(_))
        ));
        assert!(validate_api_key(Some("sk-a\tb")).is_err());
    }

    #[tokio::test]
    async fn test_single_pass_classification() {
        let service = service(vec![Ok(PIZZA_JSON.to_string())], Err(CoreError::LocalModelUnavailable("unused".to_string())), "sk-test");

        let result = structured(service.classify_image(input(ClassificationMode::Chat)).await.unwrap());
        assert_eq!(result.label, "pizza");
        assert!(result.reasoning_trace.is_none());

        let requests = service.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].endpoint, Endpoint::Responses);
        assert_eq!(requests[0].image_b64.as_deref(), Some("/9j/4A=="));
        assert!(matches!(requests[0].format, ResponseFormat::JsonSchema { .. }));
    }

    #[tokio::test]
    async fn test_invalid_key_fails_before_network() {
        let service = service(vec![Ok(PIZZA_JSON.to_string())], Err(CoreError::LocalModelUnavailable("unused".to_string())), "YOUR_KEY");

        let err = service
            .classify_image(input(ClassificationMode::Chat))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
        assert!(service.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected() {
        let service = service(vec![], Err(CoreError::LocalModelUnavailable("unused".to_string())), "sk-test");
        let mut request = input(ClassificationMode::Chat);
        request.image_data.clear();

        let err = service.classify_image(request).await.unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_reasoned_attaches_trace() {
        let service = service(
            vec![
                Ok("pizza | melted cheese; burger | bun".to_string()),
                Ok(PIZZA_JSON.to_string()),
            ],
            Err(CoreError::LocalModelUnavailable("unused".to_string())),
            "sk-test",
        );

        let result = structured(
            service
                .classify_image(input(ClassificationMode::ChatReasoned))
                .await
                .unwrap(),
        );
        let trace = result.reasoning_trace.unwrap();
        assert_eq!(trace.primary_model, "gpt-4o-mini");
        assert_eq!(trace.fallback_model, "gpt-4.1-mini");
        assert_eq!(trace.candidates, vec!["pizza", "burger"]);

        let requests = service.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert!(requests[0].format.is_none());
        assert_eq!(requests[0].max_tokens, 400);
        assert_eq!(requests[1].model, "gpt-4.1-mini");
        assert!(requests[1].prompt.contains("Candidates: pizza, burger"));
    }

    #[tokio::test]
    async fn test_reasoning_failure_matches_single_pass() {
        let reasoned = service(
            vec![
                Err(CoreError::Http {
                    status: 500,
                    detail: "boom".to_string(),
                }),
                Ok(PIZZA_JSON.to_string()),
            ],
            Err(CoreError::LocalModelUnavailable("unused".to_string())),
            "sk-test",
        );
        let single = service(vec![Ok(PIZZA_JSON.to_string())], Err(CoreError::LocalModelUnavailable("unused".to_string())), "sk-test");

        let degraded = reasoned
            .classify_image(input(ClassificationMode::ChatReasoned))
            .await
            .unwrap();
        let plain = single
            .classify_image(input(ClassificationMode::Chat))
            .await
            .unwrap();
        assert_eq!(degraded, plain);

        let requests = reasoned.transport.requests();
        assert_eq!(requests[1], single.transport.requests()[0]);
    }

    #[tokio::test]
    async fn test_unparseable_selection_is_raw() {
        let service = service(
            vec![Ok("pizza | cheese".to_string()), Ok("looks like pizza".to_string())],
            Err(CoreError::LocalModelUnavailable("unused".to_string())),
            "sk-test",
        );

        let output = service
            .classify_image(input(ClassificationMode::ChatReasoned))
            .await
            .unwrap();
        assert_eq!(
            output,
            ClassifyOutput::Raw {
                raw: "looks like pizza".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_local_mode_skips_key_check() {
        let local = LocalClassification::from_candidates(
            vec![LocalCandidate {
                label: "imagenet_class_963".to_string(),
                confidence: 0.8,
            }],
            "MobileNetV2 (ImageNet)",
        );
        let service = service(vec![], Ok(local.clone()), "");

        let output = service
            .classify_image(input(ClassificationMode::Local))
            .await
            .unwrap();
        assert_eq!(output, ClassifyOutput::Local(local));
        assert!(service.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_local_mode_propagates_unavailability() {
        let service = service(
            vec![],
            Err(CoreError::LocalModelUnavailable("no model".to_string())),
            "sk-test",
        );

        let err = service
            .classify_image(input(ClassificationMode::Local))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::LocalModelUnavailable(_)));
    }
}

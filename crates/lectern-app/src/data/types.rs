//! Common data types for lesson content
//!
//! `LessonContent` is created atomically from one content-generation call and
//! never mutated afterwards; a new topic replaces it wholesale.

use serde::{Deserialize, Serialize};

use crate::config::lesson::{MAX_BULLETS, SLIDE_COUNT};

/// One unit of lesson content: title, key points, and the narration script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(rename = "bulletPoints")]
    pub bullet_points: Vec<String>,
    /// What the teacher says for this slide
    pub script: String,
}

/// A full generated course for one topic, in presentation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub topic: String,
    pub slides: Vec<Slide>,
}

impl LessonContent {
    /// Number of slides in the lesson
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Get a slide by index
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Check the generated content against the lesson contract.
    ///
    /// The content collaborator must return exactly `SLIDE_COUNT` slides,
    /// each with a non-empty title and script and a sane number of bullets;
    /// anything else fails the generation call.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("lesson topic is empty".to_string());
        }
        if self.slides.len() != SLIDE_COUNT {
            return Err(format!(
                "expected {} slides, got {}",
                SLIDE_COUNT,
                self.slides.len()
            ));
        }
        for (i, slide) in self.slides.iter().enumerate() {
            if slide.title.trim().is_empty() {
                return Err(format!("slide {} has an empty title", i + 1));
            }
            if slide.script.trim().is_empty() {
                return Err(format!("slide {} has an empty script", i + 1));
            }
            if slide.bullet_points.is_empty() || slide.bullet_points.len() > MAX_BULLETS {
                return Err(format!(
                    "slide {} has {} bullet points",
                    i + 1,
                    slide.bullet_points.len()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lesson() -> LessonContent {
        LessonContent {
            topic: "量子力学入门".to_string(),
            slides: (1..=5)
                .map(|i| Slide {
                    title: format!("第 {} 讲", i),
                    bullet_points: vec![
                        "要点一".to_string(),
                        "要点二".to_string(),
                        "要点三".to_string(),
                    ],
                    script: format!("这是第 {} 张幻灯片的讲稿。", i),
                })
                .collect(),
        }
    }

    #[test]
    fn sample_lesson_is_valid() {
        assert!(sample_lesson().validate().is_ok());
    }

    #[test]
    fn slide_lookup() {
        let lesson = sample_lesson();
        assert_eq!(lesson.slide_count(), 5);
        assert_eq!(lesson.slide(0).unwrap().title, "第 1 讲");
        assert!(lesson.slide(5).is_none());
    }

    #[test]
    fn wrong_slide_count_fails() {
        let mut lesson = sample_lesson();
        lesson.slides.pop();
        let err = lesson.validate().unwrap_err();
        assert!(err.contains("expected 5 slides"));
    }

    #[test]
    fn empty_slides_fail() {
        let lesson = LessonContent {
            topic: "t".to_string(),
            slides: vec![],
        };
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn empty_topic_fails() {
        let mut lesson = sample_lesson();
        lesson.topic = "  ".to_string();
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn empty_title_fails() {
        let mut lesson = sample_lesson();
        lesson.slides[2].title = String::new();
        let err = lesson.validate().unwrap_err();
        assert!(err.contains("slide 3"));
    }

    #[test]
    fn empty_script_fails() {
        let mut lesson = sample_lesson();
        lesson.slides[0].script = "   ".to_string();
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn no_bullets_fails() {
        let mut lesson = sample_lesson();
        lesson.slides[1].bullet_points.clear();
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn too_many_bullets_fail() {
        let mut lesson = sample_lesson();
        lesson.slides[4].bullet_points = vec!["p".to_string(); 7];
        assert!(lesson.validate().is_err());
    }

    #[test]
    fn deserialize_wire_shape() {
        // Field name on the wire is camelCase, as the response schema requests
        let json = r#"{
            "topic": "罗马帝国史",
            "slides": [
                {"title": "起源", "bulletPoints": ["罗慕路斯", "七丘之城"], "script": "讲稿一"},
                {"title": "共和", "bulletPoints": ["元老院"], "script": "讲稿二"},
                {"title": "帝国", "bulletPoints": ["奥古斯都"], "script": "讲稿三"},
                {"title": "鼎盛", "bulletPoints": ["五贤帝"], "script": "讲稿四"},
                {"title": "衰亡", "bulletPoints": ["分裂"], "script": "讲稿五"}
            ]
        }"#;
        let lesson: LessonContent = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.topic, "罗马帝国史");
        assert_eq!(lesson.slides[0].bullet_points.len(), 2);
        assert!(lesson.validate().is_ok());
    }

    #[test]
    fn serialize_uses_camel_case_bullets() {
        let lesson = sample_lesson();
        let json = serde_json::to_string(&lesson).unwrap();
        assert!(json.contains("bulletPoints"));
        assert!(!json.contains("bullet_points"));
    }

    #[test]
    fn missing_field_fails_deserialize() {
        let json = r#"{"topic": "x", "slides": [{"title": "a", "script": "b"}]}"#;
        assert!(serde_json::from_str::<LessonContent>(json).is_err());
    }
}

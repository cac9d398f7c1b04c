//! 服务器路由
//!
//! 只负责拼接 URL，不发请求

use reqwest::Url;

use crate::error::ConfigError;
use crate::models::RegistrationNumber;
use crate::workflow::ExamCtx;

const REGISTRATION_PARAM: &str = "registration";

/// 某个测验的全部服务器路由
#[derive(Debug, Clone)]
pub struct Routes {
    base: Url,
    ctx: ExamCtx,
}

impl Routes {
    pub fn new(base_url: &str, ctx: ExamCtx) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                value: base_url.to_string(),
                reason: "不能作为基础地址".to_string(),
            });
        }
        Ok(Self { base, ctx })
    }

    pub fn ctx(&self) -> &ExamCtx {
        &self.ctx
    }

    /// POST 提交答题状态
    pub fn update_state(&self) -> Url {
        self.assessment_url(&["state"])
    }

    /// GET 某学号已存答案
    pub fn load_answers(&self, registration: &RegistrationNumber) -> Url {
        with_registration(self.assessment_url(&["answers"]), registration)
    }

    /// GET 参考答案
    pub fn load_reference(&self) -> Url {
        self.assessment_url(&["reference"])
    }

    /// GET 随机学生学号
    pub fn random_student(&self) -> Url {
        self.exam_url(&["random-student"])
    }

    /// GET Dynexite 导出的答案文本
    pub fn dynexite_answers(&self, registration: &RegistrationNumber) -> Url {
        with_registration(self.assessment_url(&["dynexite", "answers"]), registration)
    }

    /// 在新标签页中打开的 Dynexite PDF
    pub fn dynexite_pdf(&self, registration: &RegistrationNumber) -> Url {
        with_registration(self.exam_url(&["dynexite", "pdf"]), registration)
    }

    /// 在新标签页中打开的 Dynexite 链接
    pub fn dynexite_link(&self, registration: &RegistrationNumber) -> Url {
        with_registration(self.exam_url(&["dynexite", "link"]), registration)
    }

    /// POST 单个元素的动作
    pub fn element_action(&self, element_name: &str) -> Url {
        self.join(&["element", element_name, "action"])
    }

    fn exam_url(&self, tail: &[&str]) -> Url {
        let mut segments = vec!["exam", self.ctx.exam_id.as_str()];
        segments.extend_from_slice(tail);
        self.join(&segments)
    }

    fn assessment_url(&self, tail: &[&str]) -> Url {
        let mut segments = vec![
            "exam",
            self.ctx.exam_id.as_str(),
            "assessment",
            self.ctx.assessment_id.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.join(&segments)
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // new() 已拒绝 cannot-be-a-base 地址
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn with_registration(mut url: Url, registration: &RegistrationNumber) -> Url {
    url.query_pairs_mut()
        .append_pair(REGISTRATION_PARAM, registration.as_str());
    url
}

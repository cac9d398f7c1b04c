//! 内置页面回调
//!
//! 服务器下发的回调最终都落在页面模型上：改写元素内容、显示消息、移动焦点。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::error::DispatchError;
use crate::infrastructure::cookie_store::REGISTRATION_COOKIE;
use crate::infrastructure::CookieWriter;
use crate::models::PageModel;
use crate::services::{parse_payload, ActionRegistry};

pub const SET_ELEMENT_CONTENT: &str = "setElementContent";
pub const SHOW_MESSAGE: &str = "showMessage";
pub const SHOW_ERROR: &str = "showError";
pub const FOCUS_ELEMENT: &str = "focusElement";
pub const SET_REGISTRATION: &str = "setRegistration";

#[derive(Deserialize)]
struct ElementContent {
    element: String,
    content: String,
}

#[derive(Deserialize)]
struct Message {
    message: String,
}

#[derive(Deserialize)]
struct Element {
    element: String,
}

#[derive(Deserialize)]
struct Registration {
    registration: String,
}

pub(crate) fn lock_page(page: &Mutex<PageModel>) -> MutexGuard<'_, PageModel> {
    page.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 注册所有内置页面回调
pub fn register_page_actions(registry: &mut ActionRegistry, page: Arc<Mutex<PageModel>>) {
    let target = page.clone();
    registry.register(SET_ELEMENT_CONTENT, move |data| {
        let payload: ElementContent = parse_payload(SET_ELEMENT_CONTENT, data)?;
        lock_page(&target).set_content(payload.element, payload.content);
        Ok(())
    });

    let target = page.clone();
    registry.register(SHOW_MESSAGE, move |data| {
        let payload: Message = parse_payload(SHOW_MESSAGE, data)?;
        lock_page(&target).log_info(payload.message);
        Ok(())
    });

    let target = page.clone();
    registry.register(SHOW_ERROR, move |data| {
        let payload: Message = parse_payload(SHOW_ERROR, data)?;
        lock_page(&target).log_error(payload.message);
        Ok(())
    });

    registry.register(FOCUS_ELEMENT, move |data| {
        let payload: Element = parse_payload(FOCUS_ELEMENT, data)?;
        lock_page(&page).focus(payload.element);
        Ok(())
    });
}

/// 注册 `setRegistration`：填入学号输入框，值变化时写入 Cookie
///
/// 写入在持有页面锁时入队，Cookie 的写入顺序与输入框的修改顺序一致。
pub fn register_registration_action(
    registry: &mut ActionRegistry,
    page: Arc<Mutex<PageModel>>,
    cookies: CookieWriter,
) {
    registry.register(SET_REGISTRATION, move |data| {
        let payload: Registration = parse_payload(SET_REGISTRATION, data)?;
        let mut page = lock_page(&page);
        if page.registration() == payload.registration {
            return Ok(());
        }
        page.set_registration(payload.registration.clone());

        cookies
            .enqueue(REGISTRATION_COOKIE, &payload.registration)
            .map_err(|e| DispatchError::HandlerFailed {
                callback: SET_REGISTRATION.to_string(),
                message: e.to_string(),
            })
    });
}

//! Notification inbox service

use crate::{
    error::AppResult,
    models::notification::{MarkAllReadResponse, Notification, UnreadCount},
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        self.repository.notifications_list_for_user(user_id).await
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<UnreadCount> {
        let count = self.repository.notifications_count_unread(user_id).await?;
        Ok(UnreadCount { count })
    }

    /// Mark one of the caller's notifications as read
    pub async fn mark_as_read(&self, user_id: i32, id: i32) -> AppResult<Notification> {
        let notification = self.repository.notifications_get_by_id(id).await?;
        notification.ensure_owned_by(user_id)?;

        if notification.is_read {
            return Ok(notification);
        }
        self.repository.notifications_mark_read(id).await
    }

    pub async fn mark_all_as_read(&self, user_id: i32) -> AppResult<MarkAllReadResponse> {
        let updated = self.repository.notifications_mark_all_read(user_id).await?;
        Ok(MarkAllReadResponse {
            message: "All notifications marked as read".to_string(),
            updated,
        })
    }
}

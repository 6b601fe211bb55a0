//! Composition root. Owns the adapters and every piece of UI state; the HTTP
//! handlers only ever talk to this.

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info};

use crate::{
    auth::{AuthState, SessionObserver},
    error::AppError,
    model::Session,
    navigation::{NavigationView, Navigator, RootTree, Tab},
    notification::NotificationBridge,
    screen::{
        AddTaskForm, AddTaskView, DetailsView, ListScreen, ListView, LoginScreen, LoginView,
        PushAlerts, SettingsScreen, SettingsView, TaskCollection,
    },
    store::TaskStore,
};

struct Screens {
    /// Auth state the screens were last rebuilt for.
    applied: AuthState,
    tasks: TaskCollection,
    navigator: Navigator,
    list: ListScreen,
    login: LoginScreen,
    settings: SettingsScreen,
    // Kept across sign-in changes
    push_alerts: PushAlerts,
}

impl Screens {
    fn new(notifications: &NotificationBridge) -> Self {
        Screens {
            applied: AuthState::Loading,
            tasks: TaskCollection::default(),
            navigator: Navigator::default(),
            list: ListScreen::new(notifications.foreground_messages()),
            login: LoginScreen::default(),
            settings: SettingsScreen::default(),
            push_alerts: PushAlerts::new(notifications.foreground_messages()),
        }
    }

    /// Session the screens were built for, provided it is still `caller`'s.
    /// A request admitted before a sign-out or user switch is refused here.
    fn signed_in_as(&self, caller: &Session) -> Result<Session, AppError> {
        match self.applied.session() {
            Some(session) if session == caller => Ok(session.clone()),
            Some(_) => Err(AppError::AuthFailure("session changed".to_string())),
            None => Err(AppError::AuthFailure("not signed in".to_string())),
        }
    }

    fn navigation(&mut self, tree: RootTree) -> NavigationView {
        let mut view = NavigationView::new(tree, &self.navigator);
        view.alert = self.push_alerts.take();
        view
    }
}

pub struct AppState {
    store: Arc<dyn TaskStore>,
    session: SessionObserver,
    notifications: NotificationBridge,
    // Held across remote calls, so operations never interleave
    screens: Mutex<Screens>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TaskStore>,
        session: SessionObserver,
        notifications: NotificationBridge,
    ) -> Self {
        let screens = Mutex::new(Screens::new(&notifications));
        AppState {
            store,
            session,
            notifications,
            screens,
        }
    }

    pub fn session(&self) -> &SessionObserver {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationBridge {
        &self.notifications
    }

    pub fn auth_state(&self) -> AuthState {
        self.session.current()
    }

    /// Startup: push registration, launch notification, first auth report,
    /// then keep following the observer.
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let notifications = self.notifications.clone();
        tokio::spawn(async move {
            notifications.register_device().await;
        });
        self.notifications.launch_notification().await;

        self.session.start().await;
        self.sync_session().await;
        self.spawn_session_watcher()
    }

    pub fn spawn_session_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let app = Arc::clone(self);
        let mut rx = self.session.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let mut screens = app.screens.lock().await;
                app.apply_session(&mut screens, state).await;
            }
        })
    }

    /// Rebuilds the screens for whatever the observer currently reports.
    pub async fn sync_session(&self) {
        let mut screens = self.screens.lock().await;
        self.apply_session(&mut screens, self.session.current()).await;
    }

    async fn apply_session(&self, screens: &mut Screens, state: AuthState) {
        if screens.applied == state {
            return;
        }

        match &state {
            AuthState::Loading => return,
            AuthState::Authenticated(session) => {
                let tasks = match self.store.list_tasks(&session.user_id).await {
                    Ok(tasks) => {
                        if tasks.is_empty() {
                            info!("User {} has no tasks", session.user_id);
                        }
                        tasks
                    }
                    Err(err) => {
                        error!("Failed to fetch tasks: {}", err);
                        Vec::new()
                    }
                };
                screens.tasks.replace(tasks);

                let notifications = self.notifications.clone();
                tokio::spawn(async move {
                    notifications.register_device().await;
                });
            }
            AuthState::Unauthenticated => screens.tasks.clear(),
        }

        screens.navigator.reset();
        screens.list = ListScreen::new(self.notifications.foreground_messages());
        screens.login = LoginScreen::default();
        screens.settings = SettingsScreen::default();
        screens.applied = state;
    }

    pub async fn navigation(&self) -> NavigationView {
        let mut screens = self.screens.lock().await;
        screens.navigation(RootTree::from(&self.session.current()))
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginView {
        let mut screens = self.screens.lock().await;
        screens.login.submit(email, password, &self.session).await;
        let view = screens.login.view();
        // The observer has already moved on; follow it before anyone else reads the screens
        self.apply_session(&mut screens, self.session.current()).await;
        view
    }

    pub async fn list_view(&self) -> ListView {
        let mut screens = self.screens.lock().await;
        let Screens { list, tasks, .. } = &mut *screens;
        list.view(tasks)
    }

    pub async fn swipe(&self, task_id: &str) -> Result<ListView, AppError> {
        let mut screens = self.screens.lock().await;
        let Screens { list, tasks, .. } = &mut *screens;
        list.request_delete(tasks, task_id)?;
        Ok(list.view(tasks))
    }

    pub async fn confirm_delete(&self) -> ListView {
        let mut screens = self.screens.lock().await;
        let Screens { list, tasks, .. } = &mut *screens;
        list.confirm_delete(tasks, self.store.as_ref()).await;
        list.view(tasks)
    }

    pub async fn cancel_delete(&self) -> ListView {
        let mut screens = self.screens.lock().await;
        let Screens { list, tasks, .. } = &mut *screens;
        list.cancel_delete();
        list.view(tasks)
    }

    pub async fn open_details(&self, task_id: &str) -> Result<DetailsView, AppError> {
        let mut screens = self.screens.lock().await;
        let task = screens
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Task with ID: {}", task_id)))?;
        let view = DetailsView::from(&task);
        screens.navigator.open_details(task);
        Ok(view)
    }

    pub async fn open_add_task(&self) -> AddTaskView {
        let mut screens = self.screens.lock().await;
        screens.navigator.open_add_task();
        AddTaskView::blank()
    }

    /// Submits the add form and goes back to the list whatever the outcome.
    pub async fn submit_task(
        &self,
        session: &Session,
        form: AddTaskForm,
    ) -> Result<ListView, AppError> {
        let mut screens = self.screens.lock().await;
        let session = screens.signed_in_as(session)?;
        let Screens {
            list,
            tasks,
            navigator,
            ..
        } = &mut *screens;
        form.submit(Some(&session), tasks, self.store.as_ref()).await;
        if navigator.current().name() == "AddTask" {
            navigator.go_back();
        }
        Ok(list.view(tasks))
    }

    pub async fn go_back(&self) -> NavigationView {
        let mut screens = self.screens.lock().await;
        screens.navigator.go_back();
        screens.navigation(RootTree::from(&self.session.current()))
    }

    pub async fn select_tab(&self, tab: Tab) -> NavigationView {
        let mut screens = self.screens.lock().await;
        screens.navigator.select_tab(tab);
        screens.navigation(RootTree::from(&self.session.current()))
    }

    /// Mounting the settings screen; each visit re-syncs the topic.
    pub async fn settings_view(&self, session: &Session) -> Result<SettingsView, AppError> {
        let mut screens = self.screens.lock().await;
        let session = screens.signed_in_as(session)?;
        screens.navigator.select_tab(Tab::Settings);
        screens.settings.mount(&session, &self.notifications).await;
        Ok(screens.settings.view(&session))
    }

    pub async fn toggle_motivational(
        &self,
        session: &Session,
        enabled: bool,
    ) -> Result<SettingsView, AppError> {
        let mut screens = self.screens.lock().await;
        let session = screens.signed_in_as(session)?;
        if !screens.settings.is_mounted() {
            screens.settings.mount(&session, &self.notifications).await;
        }
        screens
            .settings
            .toggle_motivational(&session, &self.notifications, enabled)
            .await;
        Ok(screens.settings.view(&session))
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let mut screens = self.screens.lock().await;
        screens.settings.sign_out(&self.session).await?;
        self.apply_session(&mut screens, self.session.current()).await;
        Ok(())
    }
}

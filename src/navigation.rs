use serde::{Deserialize, Serialize};

use crate::{auth::AuthState, model::Task, screen::Alert};

/// Which navigation tree is mounted; decided by the auth state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootTree {
    /// The observer has not reported; nothing is rendered.
    Loading,
    Login,
    Tabs,
}

impl From<&AuthState> for RootTree {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => RootTree::Loading,
            AuthState::Unauthenticated => RootTree::Login,
            AuthState::Authenticated(_) => RootTree::Tabs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Tasks,
    Settings,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Tasks => "Tasks",
            Tab::Settings => "Profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TasksRoute {
    List,
    Details(Task),
    AddTask,
}

impl TasksRoute {
    pub fn name(&self) -> &'static str {
        match self {
            TasksRoute::List => "TasksList",
            TasksRoute::Details(_) => "Details",
            TasksRoute::AddTask => "AddTask",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TasksRoute::List => "Tasks",
            TasksRoute::Details(_) => "Details",
            TasksRoute::AddTask => "Add task",
        }
    }
}

static LIST_ROUTE: TasksRoute = TasksRoute::List;

// Tab bar on top of a stack whose bottom entry is always the list
#[derive(Debug, Clone)]
pub struct Navigator {
    tab: Tab,
    stack: Vec<TasksRoute>,
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator {
            tab: Tab::Tasks,
            stack: vec![TasksRoute::List],
        }
    }
}

impl Navigator {
    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn current(&self) -> &TasksRoute {
        // The base entry is never popped
        self.stack.last().unwrap_or(&LIST_ROUTE)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn open_details(&mut self, task: Task) {
        self.tab = Tab::Tasks;
        self.stack.push(TasksRoute::Details(task));
    }

    pub fn open_add_task(&mut self) {
        self.tab = Tab::Tasks;
        self.stack.push(TasksRoute::AddTask);
    }

    /// Pops one screen. Returns false when already at the list.
    pub fn go_back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Navigator::default();
    }
}

#[derive(Debug, Serialize)]
pub struct NavigationView {
    pub tree: RootTree,
    pub tab: Option<Tab>,
    pub tab_label: Option<&'static str>,
    pub route: Option<&'static str>,
    pub title: Option<&'static str>,
    /// Task shown by the details screen, when it is on top.
    pub task_id: Option<String>,
    pub depth: usize,
    /// Foreground push shown on top of everything, whatever the screen.
    pub alert: Option<Alert>,
}

impl NavigationView {
    pub fn new(tree: RootTree, navigator: &Navigator) -> Self {
        match tree {
            RootTree::Tabs => {
                let tab = navigator.tab();
                let (route, title) = match tab {
                    Tab::Tasks => (navigator.current().name(), navigator.current().title()),
                    Tab::Settings => ("Settings", tab.label()),
                };
                let task_id = match (tab, navigator.current()) {
                    (Tab::Tasks, TasksRoute::Details(task)) => Some(task.id.clone()),
                    _ => None,
                };
                NavigationView {
                    tree,
                    tab: Some(tab),
                    tab_label: Some(tab.label()),
                    route: Some(route),
                    title: Some(title),
                    task_id,
                    depth: navigator.depth(),
                    alert: None,
                }
            }
            RootTree::Login => NavigationView {
                tree,
                tab: None,
                tab_label: None,
                route: Some("Login"),
                title: None,
                task_id: None,
                depth: 0,
                alert: None,
            },
            RootTree::Loading => NavigationView {
                tree,
                tab: None,
                tab_label: None,
                route: None,
                title: None,
                task_id: None,
                depth: 0,
                alert: None,
            },
        }
    }
}

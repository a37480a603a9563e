use crate::shell::{Screen, Shell};

/// Navigates to `path`, waits for the content to settle and returns the frame.
pub async fn render(shell: &mut Shell, path: &str) -> Screen {
	shell.navigate(path);
	shell.settle().await;
	shell.render()
}

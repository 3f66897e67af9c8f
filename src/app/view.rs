// SPDX-License-Identifier: GPL-3.0-only

//! Main window and Picture-in-Picture window views

use crate::app::state::{AppModel, Message};
use crate::pip::VideoSurface;
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, ContentFit, Length, window};
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    ///
    /// Controls on top, the visible surface below.
    pub fn view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let camera_dropdown = widget::dropdown(
            &self.camera_dropdown_options,
            Some(self.selected_camera_index()),
            Message::SelectCamera,
        );

        let refresh_button =
            widget::button::icon(widget::icon::from_name("view-refresh-symbolic"))
                .on_press(Message::RefreshDevices);

        let ratio_dropdown = widget::dropdown(
            &self.ratio_dropdown_options,
            Some(self.selection.ratio().index()),
            Message::SelectAspectRatio,
        );

        let pip_button = widget::button::suggested("Toggle PIP")
            .on_press_maybe(self.pip.is_enabled().then_some(Message::TogglePip));

        let mirror_toggle =
            widget::toggler(self.selection.is_mirrored()).on_toggle(Message::ToggleMirror);

        let camera_row = widget::row()
            .push(camera_dropdown)
            .push(refresh_button)
            .spacing(spacing.space_xs)
            .align_y(Alignment::Center);

        let controls_row = widget::row()
            .push(pip_button)
            .push(ratio_dropdown)
            .push(mirror_toggle)
            .push(widget::text("Mirror camera"))
            .spacing(spacing.space_s)
            .align_y(Alignment::Center);

        widget::column()
            .push(camera_row)
            .push(controls_row)
            .push(self.surface_view(self.selection.visible_surface()))
            .spacing(spacing.space_s)
            .padding(spacing.space_s)
            .align_x(Alignment::Center)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Views for windows other than the main one
    pub fn view_window(&self, id: window::Id) -> Element<'_, Message> {
        match (self.pip_window, self.pip.active_surface()) {
            (Some(pip_id), Some(surface)) if pip_id == id => self.surface_view(surface),
            _ => widget::Space::new(Length::Fill, Length::Fill).into(),
        }
    }

    /// Latest picture of `surface`, letterboxed on black
    fn surface_view(&self, surface: VideoSurface) -> Element<'_, Message> {
        let content: Element<'_, Message> = match self.images.get(surface) {
            Some(handle) => widget::image::Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => widget::Space::new(Length::Fill, Length::Fill).into(),
        };

        widget::container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                ..Default::default()
            })
            .into()
    }
}
